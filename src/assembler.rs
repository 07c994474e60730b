// Magic Wand — Window Assembler
//
// Lays a buffer snapshot out as the model's input tensor:
//   [s0.x, s0.y, s0.z, s1.x, ...]  oldest sample first, 384 elements.
// Optionally removes gravity and quantizes to int8 according to the input
// contract the classifier declares.  Tensors live inside the assembler so a
// tick never allocates.

use crate::buffer::Snapshot;
use crate::config::{INPUT_CHANNEL_COUNT, INPUT_ELEMENT_COUNT, INPUT_SAMPLE_COUNT};
use crate::error::{ConfigError, PipelineError};

/// Preprocessing applied to the raw window before layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Raw sample values.
    None,
    /// Subtract the per-axis window mean (gravity estimate) from every sample.
    GravityRemoval,
}

/// Numeric format the classifier expects its input in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputFormat {
    Float32,
    /// Affine int8: `q = clamp(round(v / scale) + zero_point, -128, 127)`.
    Int8 { scale: f32, zero_point: i8 },
}

impl InputFormat {
    pub fn int8(scale: f32, zero_point: i8) -> Result<Self, ConfigError> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ConfigError::InvalidScale(scale));
        }
        Ok(Self::Int8 { scale, zero_point })
    }
}

/// Borrowed model input, in whichever format the classifier asked for.
#[derive(Debug, Clone, Copy)]
pub enum InputTensor<'a> {
    F32(&'a [f32; INPUT_ELEMENT_COUNT]),
    I8(&'a [i8; INPUT_ELEMENT_COUNT]),
}

impl InputTensor<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::F32(t) => t.len(),
            Self::I8(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct WindowAssembler {
    normalization: Normalization,
    float_tensor: [f32; INPUT_ELEMENT_COUNT],
    int8_tensor: [i8; INPUT_ELEMENT_COUNT],
}

impl WindowAssembler {
    pub const fn new(normalization: Normalization) -> Self {
        Self {
            normalization,
            float_tensor: [0.0; INPUT_ELEMENT_COUNT],
            int8_tensor: [0; INPUT_ELEMENT_COUNT],
        }
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Flatten a full window into the float tensor.
    pub fn assemble(&mut self, snapshot: &Snapshot<'_>) -> Result<&[f32; INPUT_ELEMENT_COUNT], PipelineError> {
        if !snapshot.is_complete() {
            return Err(PipelineError::ColdStart {
                pushed: snapshot.pushed(),
                required: INPUT_SAMPLE_COUNT,
            });
        }

        for (slot, sample) in self
            .float_tensor
            .chunks_exact_mut(INPUT_CHANNEL_COUNT)
            .zip(snapshot.iter())
        {
            slot.copy_from_slice(&sample.as_array());
        }

        if self.normalization == Normalization::GravityRemoval {
            remove_gravity(&mut self.float_tensor);
        }

        Ok(&self.float_tensor)
    }

    /// Produce the tensor in the classifier's declared input format.
    pub fn assemble_as(&mut self, snapshot: &Snapshot<'_>, format: InputFormat) -> Result<InputTensor<'_>, PipelineError> {
        self.assemble(snapshot)?;
        match format {
            InputFormat::Float32 => Ok(InputTensor::F32(&self.float_tensor)),
            InputFormat::Int8 { scale, zero_point } => {
                for (q, v) in self.int8_tensor.iter_mut().zip(self.float_tensor.iter()) {
                    *q = quantize(*v, scale, zero_point);
                }
                Ok(InputTensor::I8(&self.int8_tensor))
            }
        }
    }
}

/// Per-axis mean over the window, subtracted in place.
fn remove_gravity(tensor: &mut [f32; INPUT_ELEMENT_COUNT]) {
    let mut mean = [0.0f32; INPUT_CHANNEL_COUNT];
    for frame in tensor.chunks_exact(INPUT_CHANNEL_COUNT) {
        for (m, v) in mean.iter_mut().zip(frame) {
            *m += v;
        }
    }
    for m in mean.iter_mut() {
        *m /= INPUT_SAMPLE_COUNT as f32;
    }
    for frame in tensor.chunks_exact_mut(INPUT_CHANNEL_COUNT) {
        for (v, m) in frame.iter_mut().zip(mean.iter()) {
            *v -= m;
        }
    }
}

pub fn quantize(value: f32, scale: f32, zero_point: i8) -> i8 {
    let q = (value / scale).round() + zero_point as f32;
    q.clamp(i8::MIN as f32, i8::MAX as f32) as i8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SampleBuffer;
    use crate::events::Sample;

    fn filled_buffer(count: usize) -> SampleBuffer {
        let mut buffer = SampleBuffer::new();
        for i in 0..count {
            let v = i as f32;
            buffer.push(Sample::new(v, v + 0.25, v + 0.5));
        }
        buffer
    }

    #[test]
    fn test_cold_start_rejected() {
        let mut assembler = WindowAssembler::new(Normalization::None);
        for count in 0..INPUT_SAMPLE_COUNT {
            let buffer = filled_buffer(count);
            assert_eq!(
                assembler.assemble(&buffer.snapshot()),
                Err(PipelineError::ColdStart {
                    pushed: count,
                    required: INPUT_SAMPLE_COUNT,
                })
            );
        }
        assert!(assembler.assemble(&filled_buffer(INPUT_SAMPLE_COUNT).snapshot()).is_ok());
    }

    #[test]
    fn test_layout_oldest_first() {
        // 130 samples: window holds samples 2..=129
        let buffer = filled_buffer(INPUT_SAMPLE_COUNT + 2);
        let mut assembler = WindowAssembler::new(Normalization::None);
        let tensor = assembler.assemble(&buffer.snapshot()).unwrap();

        assert_eq!(tensor.len(), INPUT_ELEMENT_COUNT);
        assert_eq!(&tensor[..6], &[2.0, 2.25, 2.5, 3.0, 3.25, 3.5]);
        assert_eq!(tensor[INPUT_ELEMENT_COUNT - 3], 129.0);
        assert_eq!(tensor[INPUT_ELEMENT_COUNT - 1], 129.5);
    }

    #[test]
    fn test_gravity_removal_zeroes_constant_offset() {
        let mut buffer = SampleBuffer::new();
        for _ in 0..INPUT_SAMPLE_COUNT {
            buffer.push(Sample::new(0.0, 0.0, 1000.0));
        }
        let mut assembler = WindowAssembler::new(Normalization::GravityRemoval);
        let tensor = assembler.assemble(&buffer.snapshot()).unwrap();
        assert!(tensor.iter().all(|v| v.abs() < 1e-3));
    }

    #[test]
    fn test_int8_quantization() {
        assert_eq!(quantize(0.0, 0.5, -3), -3);
        assert_eq!(quantize(10.0, 0.5, 0), 20);
        assert_eq!(quantize(1000.0, 0.5, 0), 127);
        assert_eq!(quantize(-1000.0, 0.5, 0), -128);

        let buffer = filled_buffer(INPUT_SAMPLE_COUNT);
        let mut assembler = WindowAssembler::new(Normalization::None);
        let format = InputFormat::int8(1.0, 0).unwrap();
        match assembler.assemble_as(&buffer.snapshot(), format).unwrap() {
            InputTensor::I8(t) => {
                assert_eq!(t[0], 0);
                assert_eq!(t[3], 1);
                assert_eq!(t[INPUT_ELEMENT_COUNT - 3], 127);
            }
            InputTensor::F32(_) => panic!("expected int8 tensor"),
        }
    }

    #[test]
    fn test_invalid_scale() {
        assert_eq!(InputFormat::int8(0.0, 0), Err(ConfigError::InvalidScale(0.0)));
    }
}
