use candle_core::{Device, Tensor};
use docembed_core::error::{Error, Result};
use serde_json::{json, Map, Value};
use tokenizers::Tokenizer;

const WORD_START: char = '\u{2581}';
const SPECIAL_TOKENS: [&str; 4] = ["[PAD]", "[UNK]", "[CLS]", "[SEP]"];

/// Undo the phantom-space encoding GGUF applies to WordPiece vocabularies:
/// word-initial pieces carry a leading `▁`, continuation pieces lose their
/// `##`, bracketed specials are left alone.
pub fn wordpiece_token(gguf_token: &str) -> String {
    if let Some(word) = gguf_token.strip_prefix(WORD_START) {
        word.to_string()
    } else if gguf_token.starts_with('[') && gguf_token.ends_with(']') {
        gguf_token.to_string()
    } else {
        format!("##{gguf_token}")
    }
}

/// Build an uncased BERT WordPiece tokenizer (`[CLS] … [SEP]`) over a GGUF vocabulary.
pub fn build_tokenizer(gguf_vocab: &[String]) -> tokenizers::Result<Tokenizer> {
    let mut vocab = Map::new();
    for (id, token) in gguf_vocab.iter().enumerate() {
        vocab.entry(wordpiece_token(token)).or_insert_with(|| json!(id));
    }
    let id_of = |token: &str| -> tokenizers::Result<u64> {
        vocab
            .get(token)
            .and_then(Value::as_u64)
            .ok_or_else(|| format!("vocabulary has no {token} token").into())
    };
    let cls = id_of("[CLS]")?;
    let sep = id_of("[SEP]")?;
    id_of("[UNK]")?;

    let added_tokens: Vec<Value> = SPECIAL_TOKENS
        .iter()
        .filter_map(|t| vocab.get(*t).map(|id| (t, id)))
        .map(|(t, id)| {
            json!({
                "id": id, "content": t, "single_word": false, "lstrip": false,
                "rstrip": false, "normalized": false, "special": true,
            })
        })
        .collect();

    let spec = json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": added_tokens,
        "normalizer": {
            "type": "BertNormalizer",
            "clean_text": true,
            "handle_chinese_chars": true,
            "strip_accents": null,
            "lowercase": true,
        },
        "pre_tokenizer": { "type": "BertPreTokenizer" },
        "post_processor": { "type": "BertProcessing", "sep": ["[SEP]", sep], "cls": ["[CLS]", cls] },
        "decoder": { "type": "WordPiece", "prefix": "##", "cleanup": true },
        "model": {
            "type": "WordPiece",
            "unk_token": "[UNK]",
            "continuing_subword_prefix": "##",
            "max_input_chars_per_word": 100,
            "vocab": vocab,
        },
    });
    Tokenizer::from_bytes(serde_json::to_vec(&spec)?)
}

/// Tokenize one text (special tokens included) into `[1,T]` id and mask tensors.
///
/// Inputs longer than `max_len` tokens are rejected rather than truncated.
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer.encode(text, true).map_err(|e| Error::Tokenize(e.to_string()))?;
    let ids = enc.get_ids();
    if ids.is_empty() {
        return Err(Error::Tokenize("no tokens produced".into()));
    }
    if ids.len() > max_len {
        return Err(Error::ContextOverflow { tokens: ids.len(), n_ctx: max_len });
    }
    let to_row = |values: &[u32]| Tensor::from_slice(values, (1, values.len()), device);
    let input_ids = to_row(ids).map_err(|e| Error::Encode(e.to_string()))?;
    let attention_mask = to_row(enc.get_attention_mask()).map_err(|e| Error::Encode(e.to_string()))?;
    Ok((input_ids, attention_mask))
}
