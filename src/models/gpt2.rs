//! GPT-2 family causal language model on candle.
//!
//! Only the full-sequence forward pass is implemented: there is no generation
//! and no kv cache, since scoring needs the logits of every position at once.
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{embedding, layer_norm, Embedding, LayerNorm, Linear, VarBuilder};
use log::debug;
use serde::Deserialize;
use tokenizers::Tokenizer;

use crate::error::Error;

use super::LanguageModel;

/// Subset of the HuggingFace `config.json` of GPT-2 models.
#[derive(Debug, Clone, Deserialize)]
pub struct Gpt2Config {
    pub vocab_size: usize,
    pub n_positions: Option<usize>,
    /// Older checkpoints carry only `n_ctx`, hub ones carry both.
    pub n_ctx: Option<usize>,
    pub n_embd: usize,
    pub n_layer: usize,
    pub n_head: usize,
    #[serde(default = "default_layer_norm_epsilon")]
    pub layer_norm_epsilon: f64,
}

fn default_layer_norm_epsilon() -> f64 {
    1e-5
}

impl Gpt2Config {
    /// Number of learned positions, `n_positions` first, then `n_ctx`.
    pub fn context_length(&self) -> Result<usize, Error> {
        self.n_positions.or(self.n_ctx).ok_or_else(|| {
            Error::Config("model config has neither n_positions nor n_ctx".to_string())
        })
    }
}

/// GPT-2 stores projections as `Conv1D`, i.e. weights are `(in, out)`.
fn conv1d(in_dim: usize, out_dim: usize, vb: VarBuilder) -> candle_core::Result<Linear> {
    let weight = vb.get((in_dim, out_dim), "weight")?.t()?.contiguous()?;
    let bias = vb.get(out_dim, "bias")?;
    Ok(Linear::new(weight, Some(bias)))
}

/// Additive mask, `-inf` above the diagonal.
fn causal_mask(len: usize, device: &Device) -> candle_core::Result<Tensor> {
    let mask: Vec<f32> = (0..len)
        .flat_map(|i| (0..len).map(move |j| if j > i { f32::NEG_INFINITY } else { 0.0 }))
        .collect();
    Tensor::from_slice(&mask, (len, len), device)
}

struct Attention {
    c_attn: Linear,
    c_proj: Linear,
    n_head: usize,
    head_dim: usize,
}

impl Attention {
    fn load(vb: VarBuilder, cfg: &Gpt2Config) -> candle_core::Result<Self> {
        Ok(Self {
            c_attn: conv1d(cfg.n_embd, 3 * cfg.n_embd, vb.pp("c_attn"))?,
            c_proj: conv1d(cfg.n_embd, cfg.n_embd, vb.pp("c_proj"))?,
            n_head: cfg.n_head,
            head_dim: cfg.n_embd / cfg.n_head,
        })
    }

    fn forward(&self, xs: &Tensor, mask: &Tensor) -> candle_core::Result<Tensor> {
        let (b, t, c) = xs.dims3()?;
        let qkv = self.c_attn.forward(xs)?;

        let heads = |start: usize| -> candle_core::Result<Tensor> {
            qkv.narrow(2, start, c)?
                .reshape((b, t, self.n_head, self.head_dim))?
                .transpose(1, 2)?
                .contiguous()
        };
        let q = heads(0)?;
        let k = heads(c)?;
        let v = heads(2 * c)?;

        let scale = 1.0 / (self.head_dim as f64).sqrt();
        let att = q.matmul(&k.t()?.contiguous()?)?.affine(scale, 0.0)?;
        let att = att.broadcast_add(mask)?;
        let att = candle_nn::ops::softmax_last_dim(&att)?;

        let ys = att
            .matmul(&v)?
            .transpose(1, 2)?
            .contiguous()?
            .reshape((b, t, c))?;
        self.c_proj.forward(&ys)
    }
}

struct Mlp {
    c_fc: Linear,
    c_proj: Linear,
}

impl Mlp {
    fn load(vb: VarBuilder, cfg: &Gpt2Config) -> candle_core::Result<Self> {
        Ok(Self {
            c_fc: conv1d(cfg.n_embd, 4 * cfg.n_embd, vb.pp("c_fc"))?,
            c_proj: conv1d(4 * cfg.n_embd, cfg.n_embd, vb.pp("c_proj"))?,
        })
    }

    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        // candle's gelu is the tanh approximation ("gelu_new")
        self.c_proj.forward(&self.c_fc.forward(xs)?.gelu()?)
    }
}

struct Block {
    ln_1: LayerNorm,
    attn: Attention,
    ln_2: LayerNorm,
    mlp: Mlp,
}

impl Block {
    fn load(vb: VarBuilder, cfg: &Gpt2Config) -> candle_core::Result<Self> {
        Ok(Self {
            ln_1: layer_norm(cfg.n_embd, cfg.layer_norm_epsilon, vb.pp("ln_1"))?,
            attn: Attention::load(vb.pp("attn"), cfg)?,
            ln_2: layer_norm(cfg.n_embd, cfg.layer_norm_epsilon, vb.pp("ln_2"))?,
            mlp: Mlp::load(vb.pp("mlp"), cfg)?,
        })
    }

    fn forward(&self, xs: &Tensor, mask: &Tensor) -> candle_core::Result<Tensor> {
        let xs = (xs + self.attn.forward(&self.ln_1.forward(xs)?, mask)?)?;
        let ys = self.mlp.forward(&self.ln_2.forward(&xs)?)?;
        xs + ys
    }
}

/// GPT-2 model with its tokenizer.
pub struct Gpt2 {
    wte: Embedding,
    wpe: Embedding,
    blocks: Vec<Block>,
    ln_f: LayerNorm,
    /// Tied output projection, `(n_embd, vocab)`.
    lm_head: Tensor,
    tokenizer: Tokenizer,
    device: Device,
    max_length: usize,
}

impl Gpt2 {
    /// Build from loaded weights. `max_length` is capped to the context length.
    pub fn load(
        vb: VarBuilder,
        cfg: &Gpt2Config,
        tokenizer: Tokenizer,
        max_length: usize,
    ) -> Result<Self, Error> {
        // hub checkpoints exist with and without the `transformer.` prefix
        let vb = if vb.contains_tensor("transformer.wte.weight") {
            vb.pp("transformer")
        } else {
            vb
        };

        let wte = embedding(cfg.vocab_size, cfg.n_embd, vb.pp("wte"))?;
        let n_positions = cfg.context_length()?;
        let wpe = embedding(n_positions, cfg.n_embd, vb.pp("wpe"))?;
        let blocks = (0..cfg.n_layer)
            .map(|i| Block::load(vb.pp(format!("h.{i}")), cfg))
            .collect::<candle_core::Result<Vec<_>>>()?;
        let ln_f = layer_norm(cfg.n_embd, cfg.layer_norm_epsilon, vb.pp("ln_f"))?;
        let lm_head = wte.embeddings().t()?.contiguous()?;

        let max_length = max_length.min(n_positions);
        debug!(
            "gpt2: {} layers, {} heads, {} embd, vocab {}, max_length {}",
            cfg.n_layer, cfg.n_head, cfg.n_embd, cfg.vocab_size, max_length
        );

        Ok(Self {
            wte,
            wpe,
            blocks,
            ln_f,
            lm_head,
            tokenizer,
            device: vb.device().clone(),
            max_length,
        })
    }

    /// Logits for every position, `(len, vocab)`.
    fn logits(&self, ids: &[u32]) -> candle_core::Result<Tensor> {
        let len = ids.len();
        let input = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let positions = Tensor::arange(0u32, len as u32, &self.device)?;

        let mut xs = self
            .wte
            .forward(&input)?
            .broadcast_add(&self.wpe.forward(&positions)?)?;

        let mask = causal_mask(len, &self.device)?.to_dtype(xs.dtype())?;
        for block in self.blocks.iter() {
            xs = block.forward(&xs, &mask)?;
        }

        self.ln_f.forward(&xs)?.squeeze(0)?.matmul(&self.lm_head)
    }
}

impl LanguageModel for Gpt2 {
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, Error> {
        let encoding = self.tokenizer.encode(text, false)?;
        Ok(encoding.get_ids().to_vec())
    }

    fn score(&self, ids: &[u32]) -> Result<f64, Error> {
        if ids.len() < 2 {
            return Err(Error::ModelInference(format!(
                "need at least 2 tokens to score, got {}",
                ids.len()
            )));
        }
        if ids.len() > self.max_length {
            return Err(Error::ModelInference(format!(
                "{} tokens exceed the context of {}",
                ids.len(),
                self.max_length
            )));
        }

        // position i predicts token i + 1
        let len = ids.len();
        let logits = self
            .logits(ids)?
            .narrow(0, 0, len - 1)?
            .to_dtype(DType::F32)?;
        let targets = Tensor::new(&ids[1..], &self.device)?;
        let loss = candle_nn::loss::cross_entropy(&logits, &targets)?;

        Ok(loss.to_scalar::<f32>()? as f64)
    }

    fn max_length(&self) -> usize {
        self.max_length
    }
}
