#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = CoreError::NotFound {
            entity: "profile",
            id: "photo".into(),
        };
        assert_eq!(err.to_string(), "Entity not found: profile photo");

        let err = CoreError::Validation("profile must not be empty".into());
        assert_eq!(err.to_string(), "Validation failed: profile must not be empty");
    }
}
