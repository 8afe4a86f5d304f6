use crate::utils::error::{EtlError, Result};

/// Pearson product-moment correlation of two equally long samples.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(EtlError::InsufficientData {
            message: format!("samples differ in length ({} vs {})", x.len(), y.len()),
        });
    }
    if x.len() < 2 {
        return Err(EtlError::InsufficientData {
            message: format!("need at least 2 paired observations, got {}", x.len()),
        });
    }

    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(EtlError::InsufficientData {
            message: "samples contain NaN or infinite values".to_string(),
        });
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return Err(EtlError::InsufficientData {
            message: "one of the samples is constant".to_string(),
        });
    }

    // 浮點誤差可能略超出 [-1, 1]
    Ok((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Rounds half away from zero to `decimals` places, for display.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
