//! Input limits enforced before any stage runs.

use serde::{Deserialize, Serialize};

use crate::domain::{FeedbackItem, ValidationError};

/// Size limits for feedback input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackLimits {
    /// Maximum feedback text size in bytes (default: 16KB)
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: usize,

    /// Maximum number of items in one batch file (default: 10,000)
    #[serde(default = "default_max_batch_items")]
    pub max_batch_items: usize,
}

fn default_max_text_bytes() -> usize {
    16 * 1024
}
fn default_max_batch_items() -> usize {
    10_000
}

impl Default for FeedbackLimits {
    fn default() -> Self {
        Self {
            max_text_bytes: default_max_text_bytes(),
            max_batch_items: default_max_batch_items(),
        }
    }
}

impl FeedbackLimits {
    /// Validate an item's text against the size limit
    pub fn validate(&self, item: &FeedbackItem) -> Result<(), ValidationError> {
        let size = item.text().len();
        if size > self.max_text_bytes {
            return Err(ValidationError::TextTooLarge {
                actual: size,
                limit: self.max_text_bytes,
            });
        }
        Ok(())
    }
}
