/// Ordered course entries as the front end edits them. Entries may be blank
/// while the user is typing; `subjects()` drops those.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseList {
    entries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CourseListError {
    #[error("course index {index} out of range (have {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("at least one course is required")]
    LastEntry,
}

impl Default for CourseList {
    /// The form opens with one empty entry.
    fn default() -> Self {
        Self {
            entries: vec![String::new()],
        }
    }
}

impl CourseList {
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the index of the new entry.
    pub fn add(&mut self, name: impl Into<String>) -> usize {
        self.entries.push(name.into());
        self.entries.len() - 1
    }

    pub fn update(&mut self, index: usize, name: impl Into<String>) -> Result<(), CourseListError> {
        let len = self.entries.len();
        let slot = self
            .entries
            .get_mut(index)
            .ok_or(CourseListError::IndexOutOfRange { index, len })?;
        *slot = name.into();
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<String, CourseListError> {
        if index >= self.entries.len() {
            return Err(CourseListError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        if self.entries.len() == 1 {
            return Err(CourseListError::LastEntry);
        }
        Ok(self.entries.remove(index))
    }

    pub fn subjects(&self) -> Vec<String> {
        clean_subjects(&self.entries)
    }
}

/// Trims each entry and drops the blank ones, keeping order.
pub fn clean_subjects<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    raw.iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
