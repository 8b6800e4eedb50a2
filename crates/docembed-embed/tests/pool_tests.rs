use candle_core::{DType, Device, Tensor};
use docembed_core::types::Pooling;
use docembed_embed::{l2_normalize, masked_mean, pool};

fn hidden_and_mask(dev: &Device) -> (Tensor, Tensor) {
    // Two tokens with hidden dim 4; second token is masked out.
    let h = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0,  // token 0
                                 5.0, 6.0, 7.0, 8.0],    // token 1
                               (1, 2, 4), dev).unwrap();
    let mask = Tensor::from_slice(&[1u32, 0u32], (1, 2), dev).unwrap();
    (h, mask)
}

#[test]
fn masked_mean_ignores_padding() {
    let dev = Device::Cpu;
    let (h, mask) = hidden_and_mask(&dev);
    let v: Vec<Vec<f32>> = masked_mean(&h, &mask).unwrap().to_vec2().unwrap();
    assert_eq!(v[0], vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn mean_then_l2_normalize() {
    let dev = Device::Cpu;
    let (h, mask) = hidden_and_mask(&dev);
    let out = pool(&h, &mask.to_dtype(DType::F32).unwrap(), Pooling::Mean).unwrap().expect("pooled");
    let v: Vec<Vec<f32>> = l2_normalize(&out).unwrap().to_vec2().unwrap();
    let v = &v[0];
    // Mean over unmasked tokens = first token [1,2,3,4], then L2 normalize
    let norm: f32 = (1.0f32*1.0 + 2.0*2.0 + 3.0*3.0 + 4.0*4.0).sqrt();
    let expected = [1.0/norm, 2.0/norm, 3.0/norm, 4.0/norm];
    for (a, b) in v.iter().cloned().zip(expected) {
        assert!((a - b).abs() < 1e-5, "a={} b={}", a, b);
    }
}

#[test]
fn cls_and_last_pick_boundary_tokens() {
    let dev = Device::Cpu;
    let (h, mask) = hidden_and_mask(&dev);

    let cls: Vec<Vec<f32>> = pool(&h, &mask, Pooling::Cls).unwrap().expect("cls").to_vec2().unwrap();
    assert_eq!(cls[0], vec![1.0, 2.0, 3.0, 4.0]);

    let last: Vec<Vec<f32>> = pool(&h, &mask, Pooling::Last).unwrap().expect("last").to_vec2().unwrap();
    assert_eq!(last[0], vec![5.0, 6.0, 7.0, 8.0]);
}

#[test]
fn no_pooling_yields_nothing() {
    let dev = Device::Cpu;
    let (h, mask) = hidden_and_mask(&dev);
    assert!(pool(&h, &mask, Pooling::None).unwrap().is_none());
}
