//! # Field Elements
//!
//! Every signal in the ownership circuit, and the commitment itself, is an
//! element of the BN254 scalar field `Fr`. [`FieldElement`] wraps `Fr` with
//! the text encodings the outside world uses: decimal strings (what circom
//! and snarkjs emit), `0x`-prefixed big-endian hex, and plain JSON integers.
//! JSON integers must fit in a `u64`; anything larger has to be a string,
//! since JSON numbers past 2^64 lose precision.
//!
//! ## Two parsing modes
//!
//! - **Lenient** ([`FieldElement::parse`]) reduces values `>= p` modulo the
//!   field prime. Used for private inputs, where any integer is acceptable
//!   and wrapping is the field semantics.
//! - **Canonical** ([`FieldElement::parse_canonical`]) rejects values
//!   `>= p`. Used for public signals and proof coordinates, where two
//!   different strings must never name the same element.

use std::fmt;
use std::str::FromStr;

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{OwnershipError, Result};

/// Byte length of a big-endian `Fr` encoding.
const FR_BYTES: usize = 32;

/// A BN254 scalar field element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldElement(Fr);

impl FieldElement {
    /// Wrap a raw `Fr`.
    pub const fn new(value: Fr) -> Self {
        Self(value)
    }

    /// The underlying field element.
    pub fn inner(&self) -> Fr {
        self.0
    }

    /// Parse, reducing out-of-range values modulo the field prime.
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim();
        match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(hex_digits) => {
                let bytes = decode_hex(hex_digits, input)?;
                Ok(Self(Fr::from_be_bytes_mod_order(&bytes)))
            }
            None => parse_decimal(text, input).map(Self),
        }
    }

    /// Parse, rejecting anything that is not already in `[0, p)`.
    pub fn parse_canonical(input: &str) -> Result<Self> {
        let text = input.trim();
        let parsed = Self::parse(text)?;

        let canonical = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(hex_digits) => {
                let bytes = decode_hex(hex_digits, input)?;
                let significant: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();
                let mut expected = parsed.to_be_bytes();
                let first = expected.iter().position(|b| *b != 0).unwrap_or(FR_BYTES);
                expected.drain(..first);
                significant == expected
            }
            None => strip_leading_zeros(text) == parsed.to_decimal(),
        };

        if canonical {
            Ok(parsed)
        } else {
            Err(OwnershipError::MalformedInput(format!(
                "'{}' is not a canonical field element (must be below the BN254 scalar modulus)",
                input
            )))
        }
    }

    /// Decimal string form, as emitted in public-signal documents.
    pub fn to_decimal(&self) -> String {
        to_decimal(&self.0)
    }

    /// 32-byte big-endian encoding.
    pub fn to_be_bytes(&self) -> Vec<u8> {
        self.0.into_bigint().to_bytes_be()
    }
}

/// Decimal rendering of any prime field element (shared with the proof
/// document encoder, which works over the base field `Fq`).
pub(crate) fn to_decimal<F: PrimeField>(value: &F) -> String {
    value.into_bigint().to_string()
}

/// Parse a canonical decimal string into any prime field. Used for curve
/// coordinates in proof documents.
pub(crate) fn parse_canonical_decimal<F: PrimeField>(input: &str) -> Result<F> {
    let text = input.trim();
    let value = parse_decimal::<F>(text, input)?;
    if strip_leading_zeros(text) != to_decimal(&value) {
        return Err(OwnershipError::MalformedInput(format!(
            "'{}' is not a canonical field element",
            input
        )));
    }
    Ok(value)
}

fn parse_decimal<F: PrimeField>(text: &str, original: &str) -> Result<F> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OwnershipError::MalformedInput(format!(
            "'{}' is not a decimal field element",
            original
        )));
    }
    // `Fp::from_str` rejects redundant leading zeros; normalize first.
    F::from_str(strip_leading_zeros(text)).map_err(|_| {
        OwnershipError::MalformedInput(format!("'{}' is not a decimal field element", original))
    })
}

fn decode_hex(digits: &str, original: &str) -> Result<Vec<u8>> {
    if digits.is_empty() {
        return Err(OwnershipError::MalformedInput(format!(
            "'{}' has no hex digits",
            original
        )));
    }
    let padded = if digits.len() % 2 == 1 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };
    hex::decode(padded)
        .map_err(|e| OwnershipError::MalformedInput(format!("'{}' is not valid hex: {}", original, e)))
}

fn strip_leading_zeros(text: &str) -> &str {
    let trimmed = text.trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

impl From<Fr> for FieldElement {
    fn from(value: Fr) -> Self {
        Self(value)
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self(Fr::from(value))
    }
}

impl From<FieldElement> for Fr {
    fn from(value: FieldElement) -> Self {
        value.0
    }
}

impl FromStr for FieldElement {
    type Err = OwnershipError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal())
    }
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

/// A field value as it appears in JSON: a decimal/hex string, or an integer
/// that fits in a `u64`.
enum RawField {
    Int(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for RawField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(RawFieldVisitor)
    }
}

struct RawFieldVisitor;

impl<'de> Visitor<'de> for RawFieldVisitor {
    type Value = RawField;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a field element as a decimal string, a 0x-hex string, or an integer below 2^64")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<RawField, E> {
        Ok(RawField::Int(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<RawField, E> {
        u64::try_from(v)
            .map(RawField::Int)
            .map_err(|_| E::custom(format!("{} is negative; field elements are non-negative", v)))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> std::result::Result<RawField, E> {
        Err(E::custom(format!(
            "integer {} does not fit in 64 bits; write it as a decimal string",
            v
        )))
    }

    // serde_json hands integers above u64::MAX over as floats.
    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<RawField, E> {
        Err(E::custom(format!(
            "number {} is not an exact 64-bit integer; write large field elements as decimal strings",
            v
        )))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<RawField, E> {
        Ok(RawField::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<RawField, E> {
        Ok(RawField::Text(v))
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match RawField::deserialize(deserializer)? {
            RawField::Int(v) => Ok(FieldElement::from(v)),
            RawField::Text(s) => FieldElement::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

/// `deserialize_with` helper for fields that must be canonical.
pub fn deserialize_canonical<'de, D>(deserializer: D) -> std::result::Result<FieldElement, D::Error>
where
    D: Deserializer<'de>,
{
    match RawField::deserialize(deserializer)? {
        RawField::Int(v) => Ok(FieldElement::from(v)),
        RawField::Text(s) => FieldElement::parse_canonical(&s).map_err(serde::de::Error::custom),
    }
}

/// `deserialize_with` helper for a list of canonical field elements.
pub fn deserialize_canonical_vec<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<FieldElement>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<RawField>::deserialize(deserializer)?
        .into_iter()
        .map(|raw| match raw {
            RawField::Int(v) => Ok(FieldElement::from(v)),
            RawField::Text(s) => FieldElement::parse_canonical(&s).map_err(serde::de::Error::custom),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// BN254 scalar modulus, decimal.
    const MODULUS: &str =
        "21888242871839275222246405745257275088548364400416034343698204186575808495617";

    #[test]
    fn modulus_literal_is_the_scalar_field_prime() {
        assert_eq!(Fr::MODULUS.to_string(), MODULUS);
    }

    #[test]
    fn parse_decimal_and_integer_agree() {
        let a = FieldElement::parse("1234567890").unwrap();
        assert_eq!(a, FieldElement::from(1_234_567_890u64));
        assert_eq!(a.to_decimal(), "1234567890");
    }

    #[test]
    fn parse_hex() {
        let a = FieldElement::parse("0xff").unwrap();
        assert_eq!(a, FieldElement::from(255u64));
        let b = FieldElement::parse("0x1").unwrap();
        assert_eq!(b, FieldElement::from(1u64));
    }

    #[test]
    fn leading_zeros_are_tolerated() {
        assert_eq!(FieldElement::parse("007").unwrap(), FieldElement::from(7u64));
        assert_eq!(FieldElement::parse_canonical("000").unwrap(), FieldElement::from(0u64));
    }

    #[test]
    fn lenient_parse_wraps_modulo_prime() {
        // p itself reduces to zero, p + 1 to one.
        let zero = FieldElement::parse(MODULUS).unwrap();
        assert_eq!(zero.inner(), Fr::from(0u64));

        let p_plus_one =
            "21888242871839275222246405745257275088548364400416034343698204186575808495618";
        assert_eq!(FieldElement::parse(p_plus_one).unwrap().inner(), Fr::from(1u64));
    }

    #[test]
    fn canonical_parse_rejects_out_of_range() {
        let err = FieldElement::parse_canonical(MODULUS).unwrap_err();
        assert!(matches!(err, OwnershipError::MalformedInput(_)));
        let p_plus_one =
            "21888242871839275222246405745257275088548364400416034343698204186575808495618";
        assert!(FieldElement::parse_canonical(p_plus_one).is_err());

        let max = "21888242871839275222246405745257275088548364400416034343698204186575808495616";
        let ok = FieldElement::parse_canonical(max).unwrap();
        assert_eq!(ok.inner(), -Fr::from(1u64));
        assert_eq!(ok.to_decimal(), max);
    }

    #[test]
    fn canonical_hex_rejects_out_of_range() {
        let too_big = format!("0x{}", "ff".repeat(32));
        assert!(FieldElement::parse(&too_big).is_ok());
        assert!(FieldElement::parse_canonical(&too_big).is_err());
        assert!(FieldElement::parse_canonical("0x00ab").is_ok());
    }

    #[test]
    fn garbage_is_malformed() {
        for bad in ["", "abc", "-5", "12.5", "0x", "0xzz", "1e10"] {
            let err = FieldElement::parse(bad).unwrap_err();
            assert!(
                matches!(err, OwnershipError::MalformedInput(_)),
                "'{}' should be malformed",
                bad
            );
        }
    }

    #[test]
    fn serde_accepts_numbers_and_strings() {
        let from_num: FieldElement = serde_json::from_str("9876543210").unwrap();
        let from_str: FieldElement = serde_json::from_str("\"9876543210\"").unwrap();
        assert_eq!(from_num, from_str);
        assert_eq!(serde_json::to_string(&from_num).unwrap(), "\"9876543210\"");
    }

    #[test]
    fn oversized_json_integers_ask_for_a_string() {
        // 2^64: serde_json can only represent it as a float.
        let err = serde_json::from_str::<FieldElement>("18446744073709551616").unwrap_err();
        assert!(err.to_string().contains("decimal string"), "{}", err);

        let err = serde_json::from_str::<FieldElement>("-5").unwrap_err();
        assert!(err.to_string().contains("negative"), "{}", err);

        let as_text: FieldElement = serde_json::from_str("\"18446744073709551616\"").unwrap();
        assert_eq!(as_text.to_decimal(), "18446744073709551616");

        let max: FieldElement = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(max, FieldElement::from(u64::MAX));
    }

    #[test]
    fn canonical_helpers_reject_oversized_integers() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct One {
            #[serde(deserialize_with = "deserialize_canonical")]
            v: FieldElement,
        }
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct Many {
            #[serde(deserialize_with = "deserialize_canonical_vec")]
            v: Vec<FieldElement>,
        }

        let err = serde_json::from_str::<One>(r#"{ "v": 1e30 }"#).unwrap_err();
        assert!(err.to_string().contains("decimal string"), "{}", err);

        let err = serde_json::from_str::<Many>(r#"{ "v": ["1", 99999999999999999999] }"#)
            .unwrap_err();
        assert!(err.to_string().contains("decimal string"), "{}", err);
    }

    #[test]
    fn zero_renders_as_zero() {
        assert_eq!(FieldElement::from(0u64).to_decimal(), "0");
    }
}
