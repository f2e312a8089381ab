//! Wire messages and their framing.
//!
//! The manager's broadcast carries a [`Directive`]: a discriminated message
//! rather than an in-band sentinel, so an instruction whose values happen
//! to be all-NaN is ordinary work and shutdown is its own variant — the two
//! can never be confused. Replies are plain `f64` vectors. Both sides are
//! bincode-framed into the opaque byte frames the substrate transports.

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, Result};

/// One broadcast round's message from the manager to every worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Directive {
    /// Evaluate the callback against this instruction vector.
    Work(Vec<f64>),
    /// Leave the worker loop. Absorbing; no reply is sent.
    Terminate,
}

pub fn encode_directive(directive: &Directive) -> Result<Vec<u8>> {
    bincode::serialize(directive).map_err(|e| PoolError::codec("encoding directive", e))
}

pub fn decode_directive(frame: &[u8]) -> Result<Directive> {
    bincode::deserialize(frame).map_err(|e| PoolError::codec("decoding directive", e))
}

pub fn encode_reply(partial: &[f64]) -> Result<Vec<u8>> {
    bincode::serialize(partial).map_err(|e| PoolError::codec("encoding reply", e))
}

pub fn decode_reply(frame: &[u8]) -> Result<Vec<f64>> {
    bincode::deserialize(frame).map_err(|e| PoolError::codec("decoding reply", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_and_terminate_stay_distinct() {
        let work = encode_directive(&Directive::Work(vec![f64::NAN, f64::NAN])).unwrap();
        let stop = encode_directive(&Directive::Terminate).unwrap();
        assert_ne!(work, stop);

        // All-NaN work decodes as work, not as shutdown.
        match decode_directive(&work).unwrap() {
            Directive::Work(ins) => assert!(ins.iter().all(|v| v.is_nan())),
            Directive::Terminate => panic!("all-NaN instruction decoded as terminate"),
        }
        assert_eq!(decode_directive(&stop).unwrap(), Directive::Terminate);
    }

    #[test]
    fn test_reply_framing() {
        let frame = encode_reply(&[1.5, -2.0, 0.0]).unwrap();
        assert_eq!(decode_reply(&frame).unwrap(), vec![1.5, -2.0, 0.0]);
    }

    #[test]
    fn test_garbage_frame_is_a_codec_error() {
        let err = decode_directive(&[0xff; 3]).unwrap_err();
        assert!(matches!(err, PoolError::Codec { .. }));
    }
}
