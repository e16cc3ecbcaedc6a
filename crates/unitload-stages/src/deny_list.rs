use unitload_core::{StageError, TransformerStage, UnitName};

/// Rejects units whose requested name starts with a listed prefix.
#[derive(Debug, Clone)]
pub struct DenyListStage {
    id: String,
    prefixes: Vec<String>,
}

impl DenyListStage {
    pub fn new<I, S>(id: impl Into<String>, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }
}

impl TransformerStage for DenyListStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn transform(
        &self,
        name: &UnitName,
        _remapped: &UnitName,
        input: &[u8],
    ) -> Result<Option<Vec<u8>>, StageError> {
        if self.prefixes.iter().any(|p| name.starts_with(p)) {
            tracing::warn!(stage = %self.id, %name, "unit denied");
            return Ok(None);
        }
        Ok(Some(input.to_vec()))
    }
}
