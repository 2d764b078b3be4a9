use candle_core::{DType, Result, Tensor, D};

/// Number of rows of `logits` whose argmax equals the matching entry of `labels`.
pub fn count_correct(logits: &Tensor, labels: &Tensor) -> Result<usize> {
    let correct = logits
        .argmax(D::Minus1)?
        .eq(labels)?
        .to_dtype(DType::U32)?
        .sum_all()?
        .to_scalar::<u32>()?;
    Ok(correct as usize)
}
