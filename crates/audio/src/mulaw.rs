//! G.711 μ-law companding
//!
//! Standard segmented compander: bias 0x84, clip 32635, 8-segment exponent
//! from a leading-bit scan, 4-bit mantissa, sign in the high bit, final
//! one's-complement. One μ-law byte per 16-bit linear sample.

const BIAS: i32 = 0x84;
const CLIP: i32 = 32635;

/// Compress one 16-bit linear sample to μ-law
pub fn linear_to_mulaw(sample: i16) -> u8 {
    let mut magnitude = sample as i32;
    let sign: u8 = if magnitude < 0 {
        magnitude = -magnitude;
        0x80
    } else {
        0
    };
    if magnitude > CLIP {
        magnitude = CLIP;
    }
    magnitude += BIAS;

    // Segment from the position of the leading set bit above bit 7;
    // the biased magnitude is always >= 0x84 so the scan cannot underflow.
    let exponent = 7 - ((magnitude >> 7) as u8).leading_zeros();
    let mantissa = ((magnitude >> (exponent + 3)) & 0x0F) as u8;

    !(sign | ((exponent as u8) << 4) | mantissa)
}

/// Expand one μ-law byte to a 16-bit linear sample
pub fn mulaw_to_linear(byte: u8) -> i16 {
    let byte = !byte;
    let exponent = ((byte >> 4) & 0x07) as i32;
    let mantissa = (byte & 0x0F) as i32;
    let magnitude = (((mantissa << 3) + BIAS) << exponent) - BIAS;

    if byte & 0x80 != 0 {
        -magnitude as i16
    } else {
        magnitude as i16
    }
}

/// Encode little-endian 16-bit PCM bytes to μ-law, one byte per sample.
///
/// A trailing odd byte is truncated.
pub fn encode_pcm16(pcm_le: &[u8]) -> Vec<u8> {
    pcm_le
        .chunks_exact(2)
        .map(|pair| linear_to_mulaw(i16::from_le_bytes([pair[0], pair[1]])))
        .collect()
}

/// Decode μ-law bytes to little-endian 16-bit PCM bytes
pub fn decode_to_pcm16(mulaw: &[u8]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(mulaw.len() * 2);
    for &byte in mulaw {
        pcm.extend_from_slice(&mulaw_to_linear(byte).to_le_bytes());
    }
    pcm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert_eq!(linear_to_mulaw(0), 0xFF);
        assert_eq!(linear_to_mulaw(1000), 0xCE);
        assert_eq!(linear_to_mulaw(-1000), 0x4E);

        assert_eq!(mulaw_to_linear(0xFF), 0);
        assert_eq!(mulaw_to_linear(0xCE), 988);
        assert_eq!(mulaw_to_linear(0x4E), -988);
    }

    #[test]
    fn test_round_trip_small_amplitudes_within_128() {
        for s in (-8000i16..=8000).step_by(7) {
            let decoded = mulaw_to_linear(linear_to_mulaw(s));
            let error = (decoded as i32 - s as i32).abs();
            assert!(error <= 128, "sample {s}: decoded {decoded}, error {error}");
        }
    }

    #[test]
    fn test_round_trip_quantization_bound() {
        // Quantization error grows with the segment; it is bounded by a
        // quarter of the segment step, i.e. (|s| + BIAS) / 32.
        for s in (-32635i16..=32635).step_by(17) {
            let decoded = mulaw_to_linear(linear_to_mulaw(s));
            let error = (decoded as i32 - s as i32).abs();
            let bound = ((s.unsigned_abs() as i32 + 0x84) / 32).max(4);
            assert!(
                error <= bound,
                "sample {s}: decoded {decoded}, error {error} > bound {bound}"
            );
        }
    }

    #[test]
    fn test_clip_extremes_do_not_panic() {
        for s in [i16::MIN, -32636, 32636, i16::MAX] {
            let byte = linear_to_mulaw(s);
            let decoded = mulaw_to_linear(byte);
            assert_eq!(decoded.signum(), s.signum());
        }
    }

    #[test]
    fn test_encode_empty_and_odd_input() {
        assert!(encode_pcm16(&[]).is_empty());

        // 3 bytes = one sample plus a truncated trailing byte
        let encoded = encode_pcm16(&[0x00, 0x00, 0x7F]);
        assert_eq!(encoded.len(), 1);
        assert_eq!(encoded[0], 0xFF);
    }

    #[test]
    fn test_decode_length() {
        assert!(decode_to_pcm16(&[]).is_empty());
        assert_eq!(decode_to_pcm16(&[0xFF; 160]).len(), 320);
    }
}
