//! Embedding model descriptors

/// An embedding model hosted on the HuggingFace hub
#[derive(Debug, Clone)]
pub struct EmbeddingModel {
    /// Model identifier on HuggingFace
    pub repo_id: &'static str,
    /// Weight files to try, in order of preference
    pub weight_files: &'static [&'static str],
    /// Length of the produced vectors; must match the `VECTOR(n)` column
    pub dimension: usize,
    /// Longest input in tokens, longer inputs are truncated
    pub max_tokens: usize,
    /// Approximate RAM required in GB
    pub ram_required_gb: f64,
    pub display_name: &'static str,
    /// Model parameter count (for display)
    pub params: &'static str,
}

impl EmbeddingModel {
    /// BAAI's multilingual BGE-M3 (XLM-RoBERTa large backbone, dense output only)
    pub const BGE_M3: EmbeddingModel = EmbeddingModel {
        repo_id: "BAAI/bge-m3",
        weight_files: &["model.safetensors", "pytorch_model.bin"],
        dimension: 1024,
        max_tokens: 8192,
        ram_required_gb: 3.0,
        display_name: "BGE-M3",
        params: "568M",
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bge_m3_descriptor() {
        let model = EmbeddingModel::BGE_M3;
        assert_eq!(model.repo_id, "BAAI/bge-m3");
        assert_eq!(model.dimension, 1024);
        assert_eq!(model.max_tokens, 8192);
        assert_eq!(model.weight_files, &["model.safetensors", "pytorch_model.bin"]);
    }
}
