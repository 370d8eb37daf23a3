//! Tiny GPT-2 used by the model tests: 8 word-level tokens, 1 layer, 16 positions.
use std::collections::HashMap;

use candle_core::{DType, Device, Tensor};
use serde_json::{json, Value};
use tokenizers::Tokenizer;

use super::Gpt2Config;

pub const VOCAB: [&str; 8] = ["<unk>", "a", "b", "c", "d", "e", "f", "g"];

/// Shaped like a hub `config.json`, with both `n_ctx` and `n_positions`.
pub fn tiny_config_json() -> Value {
    json!({
        "activation_function": "gelu_new",
        "architectures": ["GPT2LMHeadModel"],
        "layer_norm_epsilon": 1e-5,
        "model_type": "gpt2",
        "n_ctx": 16,
        "n_embd": 4,
        "n_head": 2,
        "n_layer": 1,
        "n_positions": 16,
        "vocab_size": VOCAB.len()
    })
}

pub fn tiny_config() -> Gpt2Config {
    serde_json::from_value(tiny_config_json()).unwrap()
}

pub fn tiny_tokenizer_json() -> String {
    let vocab: HashMap<String, u32> = VOCAB
        .iter()
        .enumerate()
        .map(|(i, w)| (w.to_string(), i as u32))
        .collect();
    json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": { "type": "WordLevel", "vocab": vocab, "unk_token": "<unk>" }
    })
    .to_string()
}

pub fn tiny_tokenizer() -> Tokenizer {
    tiny_tokenizer_json().parse().unwrap()
}

/// Every weight zero, layer norms with unit gain: logits are all zero,
/// so the model is uniform over the vocabulary.
pub fn zero_tensors(cfg: &Gpt2Config) -> HashMap<String, Tensor> {
    let device = Device::Cpu;
    let mut ts: HashMap<String, Tensor> = HashMap::new();
    let zeros = |shape: Vec<usize>| Tensor::zeros(shape, DType::F32, &device).unwrap();
    let ones = |shape: Vec<usize>| Tensor::ones(shape, DType::F32, &device).unwrap();
    let e = cfg.n_embd;

    ts.insert("wte.weight".into(), zeros(vec![cfg.vocab_size, e]));
    ts.insert(
        "wpe.weight".into(),
        zeros(vec![cfg.context_length().unwrap(), e]),
    );
    for ln in ["h.0.ln_1", "h.0.ln_2", "ln_f"] {
        ts.insert(format!("{ln}.weight"), ones(vec![e]));
        ts.insert(format!("{ln}.bias"), zeros(vec![e]));
    }
    for (name, i, o) in [
        ("h.0.attn.c_attn", e, 3 * e),
        ("h.0.attn.c_proj", e, e),
        ("h.0.mlp.c_fc", e, 4 * e),
        ("h.0.mlp.c_proj", 4 * e, e),
    ] {
        ts.insert(format!("{name}.weight"), zeros(vec![i, o]));
        ts.insert(format!("{name}.bias"), zeros(vec![o]));
    }
    ts
}
