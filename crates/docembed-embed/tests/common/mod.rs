//! Writes a tiny randomly initialised BERT in llama.cpp GGUF layout.

use std::fs::File;
use std::path::Path;

use candle_core::quantized::gguf_file::{self, Value};
use candle_core::quantized::{GgmlDType, QTensor};
use candle_core::{Device, Tensor};

pub const HIDDEN: usize = 8;
pub const FF: usize = 16;
pub const CONTEXT: usize = 16;

pub const VOCAB: [&str; 10] = [
    "[PAD]", "[UNK]", "[CLS]", "[SEP]", "\u{2581}hello", "\u{2581}world", "ing", "\u{2581}sing", "\u{2581}the", "\u{2581}a",
];

pub struct TinyModel {
    pub arch: &'static str,
    pub pooling: Option<u32>,
    pub causal: bool,
    /// GGUF tensor name left out of the written file.
    pub omit: Option<&'static str>,
}

impl Default for TinyModel {
    fn default() -> Self { Self { arch: "bert", pooling: Some(2), causal: false, omit: None } }
}

impl TinyModel {
    pub fn write(&self, path: &Path) {
        let dev = Device::Cpu;
        let randn = |shape: &[usize]| Tensor::randn(0f32, 0.5f32, shape, &dev).unwrap();
        let ones = |n: usize| Tensor::ones(n, candle_core::DType::F32, &dev).unwrap();
        let zeros = |n: usize| Tensor::zeros(n, candle_core::DType::F32, &dev).unwrap();

        let mut tensors: Vec<(String, Tensor)> = vec![
            ("token_embd.weight".into(), randn(&[VOCAB.len(), HIDDEN])),
            ("token_types.weight".into(), randn(&[2, HIDDEN])),
            ("position_embd.weight".into(), randn(&[CONTEXT, HIDDEN])),
            ("token_embd_norm.weight".into(), ones(HIDDEN)),
            ("token_embd_norm.bias".into(), zeros(HIDDEN)),
        ];
        for (module, out_dim, in_dim) in [
            ("attn_q", HIDDEN, HIDDEN),
            ("attn_k", HIDDEN, HIDDEN),
            ("attn_v", HIDDEN, HIDDEN),
            ("attn_output", HIDDEN, HIDDEN),
            ("ffn_up", FF, HIDDEN),
            ("ffn_down", HIDDEN, FF),
        ] {
            tensors.push((format!("blk.0.{module}.weight"), randn(&[out_dim, in_dim])));
            tensors.push((format!("blk.0.{module}.bias"), zeros(out_dim)));
        }
        for norm in ["attn_output_norm", "layer_output_norm"] {
            tensors.push((format!("blk.0.{norm}.weight"), ones(HIDDEN)));
            tensors.push((format!("blk.0.{norm}.bias"), zeros(HIDDEN)));
        }
        let qtensors: Vec<(String, QTensor)> = tensors
            .into_iter()
            .filter(|(name, _)| Some(name.as_str()) != self.omit)
            .map(|(name, t)| (name, QTensor::quantize(&t, GgmlDType::F32).unwrap()))
            .collect();

        let arch = self.arch;
        let mut metadata: Vec<(String, Value)> = vec![
            ("general.architecture".into(), Value::String(arch.into())),
            (format!("{arch}.context_length"), Value::U32(CONTEXT as u32)),
            (format!("{arch}.embedding_length"), Value::U32(HIDDEN as u32)),
            (format!("{arch}.feed_forward_length"), Value::U32(FF as u32)),
            (format!("{arch}.block_count"), Value::U32(1)),
            (format!("{arch}.attention.head_count"), Value::U32(2)),
            (format!("{arch}.attention.layer_norm_epsilon"), Value::F32(1e-12)),
            (format!("{arch}.attention.causal"), Value::Bool(self.causal)),
            ("tokenizer.ggml.model".into(), Value::String("bert".into())),
            (
                "tokenizer.ggml.tokens".into(),
                Value::Array(VOCAB.iter().map(|t| Value::String(t.to_string())).collect()),
            ),
        ];
        if let Some(code) = self.pooling {
            metadata.push((format!("{arch}.pooling_type"), Value::U32(code)));
        }

        let md: Vec<(&str, &Value)> = metadata.iter().map(|(k, v)| (k.as_str(), v)).collect();
        let ts: Vec<(&str, &QTensor)> = qtensors.iter().map(|(k, t)| (k.as_str(), t)).collect();
        let mut file = File::create(path).unwrap();
        gguf_file::write(&mut file, &md, &ts).unwrap();
    }
}
