//! Rotating selection of the identities used in a tick.
use surge_core::ConfigError;

/// Indices into a pool, in selection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    indices: Vec<usize>,
}

impl Window {
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}

/// Start offset of tick `tick` for windows of `unit` over a pool of `len`.
pub fn start_offset(tick: u64, unit: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    ((tick as u128 * unit as u128) % len as u128) as usize
}

/// Reject windows that could never be served by a pool of `len`.
pub fn validate(unit: usize, len: usize) -> Result<(), ConfigError> {
    if unit > len {
        return Err(ConfigError::WindowTooLarge {
            window: unit,
            available: len,
        });
    }
    Ok(())
}

/// `unit` contiguous indices starting at `start`, wrapping to the head of the pool.
pub fn select(len: usize, unit: usize, start: usize) -> Result<Window, ConfigError> {
    validate(unit, len)?;
    if unit == 0 {
        return Ok(Window { indices: vec![] });
    }

    let start = start % len;
    let indices = if start + unit <= len {
        (start..start + unit).collect()
    } else {
        let head = unit - (len - start);
        (start..len).chain(0..head).collect()
    };
    Ok(Window { indices })
}
