use unitload_core::{StageError, TransformerStage, UnitName};

/// Replaces every occurrence of `find` with `replace`.
///
/// Units without a match pass through unchanged.
#[derive(Debug, Clone)]
pub struct BytePatchStage {
    id: String,
    find: Vec<u8>,
    replace: Vec<u8>,
}

impl BytePatchStage {
    pub fn new(
        id: impl Into<String>,
        find: impl Into<Vec<u8>>,
        replace: impl Into<Vec<u8>>,
    ) -> Result<Self, StageError> {
        let find = find.into();
        if find.is_empty() {
            return Err(StageError::Construction(
                "byte patch needs a non-empty pattern".to_string(),
            ));
        }
        Ok(Self {
            id: id.into(),
            find,
            replace: replace.into(),
        })
    }
}

impl TransformerStage for BytePatchStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn transform(
        &self,
        name: &UnitName,
        _remapped: &UnitName,
        input: &[u8],
    ) -> Result<Option<Vec<u8>>, StageError> {
        let mut output = Vec::with_capacity(input.len());
        let mut hits = 0usize;
        let mut rest = input;

        while !rest.is_empty() {
            if rest.starts_with(&self.find) {
                output.extend_from_slice(&self.replace);
                rest = &rest[self.find.len()..];
                hits += 1;
            } else {
                output.push(rest[0]);
                rest = &rest[1..];
            }
        }

        if hits > 0 {
            tracing::debug!(stage = %self.id, %name, hits, "byte patch applied");
        }
        Ok(Some(output))
    }
}

/// Appends a fixed trailer to every unit.
#[derive(Debug, Clone)]
pub struct AppendTrailerStage {
    id: String,
    trailer: Vec<u8>,
}

impl AppendTrailerStage {
    pub fn new(id: impl Into<String>, trailer: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            trailer: trailer.into(),
        }
    }
}

impl TransformerStage for AppendTrailerStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn transform(
        &self,
        _name: &UnitName,
        _remapped: &UnitName,
        input: &[u8],
    ) -> Result<Option<Vec<u8>>, StageError> {
        let mut output = Vec::with_capacity(input.len() + self.trailer.len());
        output.extend_from_slice(input);
        output.extend_from_slice(&self.trailer);
        Ok(Some(output))
    }
}
