use burn::nn::{
    BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Embedding, EmbeddingConfig, Linear,
    LinearConfig,
};
use burn::prelude::*;

/// Vocabulary size and output width of one categorical embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EmbeddingSize {
    /// Number of distinct codes the column can take.
    pub cardinality: usize,
    /// Embedding vector width.
    pub dim: usize,
}

/// Configuration for the TabularModel.
///
/// ```text
/// categorical (rows, n_cat) ─ Embedding per column ─ concat ─ Dropout ─┐
///                                                                      ├ concat
/// continuous  (rows, n_cont) ───────────────────────────── BatchNorm ──┘
///   → [Linear → ReLU → BatchNorm → Dropout] per hidden size
///   → Linear(→ out_size)
///   → (rows, out_size)
/// ```
#[derive(Config, Debug)]
pub struct TabularModelConfig {
    /// One entry per categorical column, in column order.
    pub embedding_sizes: Vec<EmbeddingSize>,
    /// Number of continuous feature columns.
    pub n_continuous: usize,
    /// Output width. 1 for scalar regression.
    #[config(default = 1)]
    pub out_size: usize,
    /// Hidden layer widths.
    #[config(default = "vec![200, 100]")]
    pub hidden: Vec<usize>,
    /// Dropout probability for the embeddings and every hidden block.
    #[config(default = 0.4)]
    pub dropout: f64,
}

impl TabularModelConfig {
    /// Width of the first hidden layer's input: embedding dims plus continuous columns.
    pub fn input_width(&self) -> usize {
        self.embedding_sizes.iter().map(|e| e.dim).sum::<usize>() + self.n_continuous
    }

    /// Initialize a TabularModel with the given configuration.
    pub fn init<B: Backend>(&self, device: &B::Device) -> TabularModel<B> {
        let embeddings = self
            .embedding_sizes
            .iter()
            .map(|e| EmbeddingConfig::new(e.cardinality, e.dim).init(device))
            .collect();

        let mut hidden = Vec::with_capacity(self.hidden.len());
        let mut d_in = self.input_width();
        for &d_out in &self.hidden {
            hidden.push(HiddenBlock {
                linear: LinearConfig::new(d_in, d_out).init(device),
                norm: BatchNormConfig::new(d_out).init(device),
                dropout: DropoutConfig::new(self.dropout).init(),
            });
            d_in = d_out;
        }

        TabularModel {
            embeddings,
            embedding_dropout: DropoutConfig::new(self.dropout).init(),
            continuous_norm: BatchNormConfig::new(self.n_continuous).init(device),
            hidden,
            output: LinearConfig::new(d_in, self.out_size).init(device),
        }
    }
}

/// Linear → ReLU → BatchNorm → Dropout.
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
    norm: BatchNorm<B, 0>,
    dropout: Dropout,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear.forward(x);
        let x = burn::tensor::activation::relu(x);
        let x = self.norm.forward(x);
        self.dropout.forward(x)
    }
}

/// Embedding + MLP regressor over mixed categorical/continuous rows.
///
/// Dropout and batch statistics are only active on an autodiff backend;
/// call `.valid()` to get the inference-mode model.
#[derive(Module, Debug)]
pub struct TabularModel<B: Backend> {
    /// One embedding table per categorical column.
    embeddings: Vec<Embedding<B>>,
    embedding_dropout: Dropout,
    continuous_norm: BatchNorm<B, 0>,
    hidden: Vec<HiddenBlock<B>>,
    output: Linear<B>,
}

impl<B: Backend> TabularModel<B> {
    /// Forward pass.
    ///
    /// Input shapes: categorical `(rows, n_cat)` codes, continuous `(rows, n_cont)`.
    /// Output shape: `(rows, out_size)`.
    pub fn forward(&self, categorical: Tensor<B, 2, Int>, continuous: Tensor<B, 2>) -> Tensor<B, 2> {
        let [rows, n_cat] = categorical.dims();
        assert_eq!(
            n_cat,
            self.embeddings.len(),
            "expected {} categorical columns, got {n_cat}",
            self.embeddings.len()
        );

        let continuous = self.continuous_norm.forward(continuous);

        let x = if self.embeddings.is_empty() {
            continuous
        } else {
            let embedded: Vec<Tensor<B, 2>> = self
                .embeddings
                .iter()
                .enumerate()
                .map(|(col, embedding)| {
                    let codes = categorical.clone().slice([0..rows, col..col + 1]);
                    embedding.forward(codes).squeeze::<2>(1) // (rows, dim)
                })
                .collect();
            let embedded = self.embedding_dropout.forward(Tensor::cat(embedded, 1));
            Tensor::cat(vec![embedded, continuous], 1)
        };

        let x = self.hidden.iter().fold(x, |x, block| block.forward(x));
        self.output.forward(x)
    }

    /// Number of categorical columns the model expects.
    pub fn n_categorical(&self) -> usize {
        self.embeddings.len()
    }
}
