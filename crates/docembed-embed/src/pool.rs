use candle_core::{DType, IndexOp, Result, Tensor};
use docembed_core::types::Pooling;

/// Collapse `[B,T,H]` hidden states into `[B,H]` sequence embeddings.
///
/// Returns `None` for `Pooling::None`, where no sequence embedding exists.
pub fn pool(hidden: &Tensor, attention_mask: &Tensor, pooling: Pooling) -> Result<Option<Tensor>> {
    let (_batch, time, _hidden_dim) = hidden.dims3()?;
    let pooled = match pooling {
        Pooling::None => return Ok(None),
        Pooling::Mean => masked_mean(hidden, attention_mask)?,
        Pooling::Cls => hidden.i((.., 0, ..))?.contiguous()?,
        Pooling::Last => hidden.i((.., time.saturating_sub(1), ..))?.contiguous()?,
    };
    Ok(Some(pooled))
}

pub fn masked_mean(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (_batch, _time, hidden_dim) = hidden.dims3()?;
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_3d = mask.unsqueeze(2)?;
    let mask_broadcast = mask_3d.broadcast_as(hidden.shape()).or_else(|_| mask_3d.repeat((1, 1, hidden_dim)))?;
    let masked = (hidden * &mask_broadcast)?;
    let sum = masked.sum(1)?;
    let lengths = mask.sum(1)?.unsqueeze(1)?.to_dtype(sum.dtype())?;
    sum.broadcast_div(&lengths)
}

/// Scale each row of `[B,H]` to unit L2 norm.
pub fn l2_normalize(emb: &Tensor) -> Result<Tensor> {
    let eps_val = match emb.dtype() { DType::F16 => 1e-6f32, _ => 1e-12f32 };
    let eps = Tensor::new(&[eps_val], emb.device())?.to_dtype(emb.dtype())?.unsqueeze(0)?;
    let norm = emb.sqr()?.sum_keepdim(1)?.sqrt()?;
    let norm = norm.broadcast_add(&eps)?;
    emb.broadcast_div(&norm)
}
