use hyper::header::{HeaderMap, ACCEPT_ENCODING};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub(super) enum ParseEncodingError {
    #[error("Invalid encoding")]
    InvalidEncoding,
}

#[derive(PartialEq, Debug)]
pub(super) struct AcceptedEncoding {
    pub(super) encoding: String,
    pub(super) quality: f32,
}

impl FromStr for AcceptedEncoding {
    type Err = ParseEncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut iter = s.split(';');
        let encoding = iter
            .next()
            .map(str::trim)
            .filter(|encoding| !encoding.is_empty())
            .ok_or(ParseEncodingError::InvalidEncoding)?;

        let quality = iter
            .next()
            .and_then(|qval| qval.trim().trim_start_matches("q=").parse::<f32>().ok())
            .unwrap_or(1f32);

        Ok(AcceptedEncoding {
            encoding: encoding.to_ascii_lowercase(),
            quality,
        })
    }
}

/// Returns the encodings accepted by the client sorted by quality, with the preferred encoding
/// first. Encodings the client explicitly refuses with `q=0` are left out.
pub(super) fn accepted_encodings(headers: &HeaderMap) -> Vec<AcceptedEncoding> {
    let mut accepted_encodings: Vec<AcceptedEncoding> = headers
        .get_all(ACCEPT_ENCODING)
        .iter()
        .filter_map(|val| val.to_str().ok())
        .flat_map(|val| val.split(','))
        .filter_map(|val| val.parse::<AcceptedEncoding>().ok())
        .filter(|accepted| accepted.quality > 0f32)
        .collect();

    // stable sort, so equal weights keep the order the client sent them in
    accepted_encodings.sort_by(|a, b| {
        b.quality
            .partial_cmp(&a.quality)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    accepted_encodings
}
