pub type ScrollmorphResult<T> = Result<T, ScrollmorphError>;

#[derive(thiserror::Error, Debug)]
pub enum ScrollmorphError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("descriptor error: {0}")]
    Descriptor(String),

    #[error("scroll source error: {0}")]
    ScrollSource(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScrollmorphError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn descriptor(msg: impl Into<String>) -> Self {
        Self::Descriptor(msg.into())
    }

    pub fn scroll_source(msg: impl Into<String>) -> Self {
        Self::ScrollSource(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ScrollmorphError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            ScrollmorphError::descriptor("x")
                .to_string()
                .contains("descriptor error:")
        );
        assert!(
            ScrollmorphError::scroll_source("x")
                .to_string()
                .contains("scroll source error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ScrollmorphError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
