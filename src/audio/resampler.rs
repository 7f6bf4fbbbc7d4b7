/*!
One-shot conversion of a decoded clip to the output device's layout.

Clips are short and decoded in full, so the whole buffer is converted at
once: channels are remapped first, then the rate is changed by linear
interpolation between neighbouring frames.
*/

use crate::audio::decoder::DecodedClip;

/// Resample interleaved `input` from `src_rate` to `dst_rate`.
///
/// The last source frame is always reached, so the output covers the full
/// clip without a trailing gap.
pub fn resample_linear(input: &[f32], channels: usize, src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if channels == 0 || src_rate == 0 || dst_rate == 0 {
        return Vec::new();
    }
    if src_rate == dst_rate {
        return input.to_vec();
    }

    let in_frames = input.len() / channels;
    if in_frames == 0 {
        return Vec::new();
    }

    let step = src_rate as f64 / dst_rate as f64;
    let out_frames = ((in_frames as f64) / step).round().max(1.0) as usize;
    let last = in_frames - 1;

    let mut out = Vec::with_capacity(out_frames * channels);
    for n in 0..out_frames {
        let pos = n as f64 * step;
        let i = (pos.floor() as usize).min(last);
        let j = (i + 1).min(last);
        let frac = (pos - i as f64).clamp(0.0, 1.0) as f32;

        out.extend((0..channels).map(|c| {
            let s0 = input[i * channels + c];
            let s1 = input[j * channels + c];
            s0 + (s1 - s0) * frac
        }));
    }
    out
}

/// Convert between channel counts: mono is duplicated, downmix to mono
/// averages, anything else copies the shared channels and pads with silence.
pub fn remap_channels(input: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return input.to_vec();
    }

    let frames = input.len() / from;
    let mut out = Vec::with_capacity(frames * to);
    for frame in input.chunks_exact(from) {
        if from == 1 {
            out.extend(std::iter::repeat(frame[0]).take(to));
        } else if to == 1 {
            out.push(frame.iter().sum::<f32>() / from as f32);
        } else {
            let shared = from.min(to);
            out.extend_from_slice(&frame[..shared]);
            out.extend(std::iter::repeat(0.0).take(to - shared));
        }
    }
    out
}

/// Produce samples ready for a stream with `dst_rate` and `dst_channels`
pub fn prepare_clip(clip: &DecodedClip, dst_rate: u32, dst_channels: usize) -> Vec<f32> {
    let remapped = remap_channels(&clip.samples, clip.channels, dst_channels);
    resample_linear(&remapped, dst_channels, clip.sample_rate, dst_rate)
}
