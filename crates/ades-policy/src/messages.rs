//! Message identifiers and parameters
//!
//! Checks report opaque `(MessageTag, Vec<Param>)` pairs. Rendering them to
//! human text is left to whoever consumes the report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of check identifiers.
///
/// The serialized name doubles as the check name in reports; the matching
/// answer key (`<TAG>_ANS`) identifies the message emitted on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageTag {
    // Identification of the signing certificate
    BbbIcsIsci,
    BbbIcsIcdvv,

    // Cryptographic verification
    BbbCvIrdof,
    BbbCvIrdoi,
    BbbCvDmenmnd,
    BbbCvTspIrdof,
    BbbCvTspIrdoi,
    BbbCvIsi,
    BbbCvAsccm,

    // X.509 certificate validation
    BbbXcvCccbb,
    BbbXcvSub,
    BbbXcvIcsi,
    BbbXcvIctivrsc,
    BbbXcvIrdpfc,
    BbbXcvIardpfc,
    BbbXcvRfc,
    BbbXcvIscr,
    BbbXcvIscoh,
    BbbXcvIvtbctsd,
    BbbXcvIotaa,
    BbbXcvAsccm,

    // Signature acceptance
    BbbSavIsqpstp,

    // Control-time sliding
    CtsDrie,
    CtsSct,
    CtsIsd,

    // Past certificate / signature validation
    PcvIvtsc,
    PcvTafrb,
    PsvIpcva,
    PsvIpsvc,
    PsvIpcriaidbedc,
    PsvItposvaobct,
    PsvIbstbsce,
    TsvIbstaidosc,
    TsvWacrabst,
}

impl MessageTag {
    pub fn code(&self) -> &'static str {
        match self {
            MessageTag::BbbIcsIsci => "BBB_ICS_ISCI",
            MessageTag::BbbIcsIcdvv => "BBB_ICS_ICDVV",
            MessageTag::BbbCvIrdof => "BBB_CV_IRDOF",
            MessageTag::BbbCvIrdoi => "BBB_CV_IRDOI",
            MessageTag::BbbCvDmenmnd => "BBB_CV_DMENMND",
            MessageTag::BbbCvTspIrdof => "BBB_CV_TSP_IRDOF",
            MessageTag::BbbCvTspIrdoi => "BBB_CV_TSP_IRDOI",
            MessageTag::BbbCvIsi => "BBB_CV_ISI",
            MessageTag::BbbCvAsccm => "BBB_CV_ASCCM",
            MessageTag::BbbXcvCccbb => "BBB_XCV_CCCBB",
            MessageTag::BbbXcvSub => "BBB_XCV_SUB",
            MessageTag::BbbXcvIcsi => "BBB_XCV_ICSI",
            MessageTag::BbbXcvIctivrsc => "BBB_XCV_ICTIVRSC",
            MessageTag::BbbXcvIrdpfc => "BBB_XCV_IRDPFC",
            MessageTag::BbbXcvIardpfc => "BBB_XCV_IARDPFC",
            MessageTag::BbbXcvRfc => "BBB_XCV_RFC",
            MessageTag::BbbXcvIscr => "BBB_XCV_ISCR",
            MessageTag::BbbXcvIscoh => "BBB_XCV_ISCOH",
            MessageTag::BbbXcvIvtbctsd => "BBB_XCV_IVTBCTSD",
            MessageTag::BbbXcvIotaa => "BBB_XCV_IOTAA",
            MessageTag::BbbXcvAsccm => "BBB_XCV_ASCCM",
            MessageTag::BbbSavIsqpstp => "BBB_SAV_ISQPSTP",
            MessageTag::CtsDrie => "CTS_DRIE",
            MessageTag::CtsSct => "CTS_SCT",
            MessageTag::CtsIsd => "CTS_ISD",
            MessageTag::PcvIvtsc => "PCV_IVTSC",
            MessageTag::PcvTafrb => "PCV_TAFRB",
            MessageTag::PsvIpcva => "PSV_IPCVA",
            MessageTag::PsvIpsvc => "PSV_IPSVC",
            MessageTag::PsvIpcriaidbedc => "PSV_IPCRIAIDBEDC",
            MessageTag::PsvItposvaobct => "PSV_ITPOSVAOBCT",
            MessageTag::PsvIbstbsce => "PSV_IBSTBSCE",
            MessageTag::TsvIbstaidosc => "TSV_IBSTAIDOSC",
            MessageTag::TsvWacrabst => "TSV_WACRABST",
        }
    }

    /// Key of the message emitted when this check does not pass
    pub fn answer_key(&self) -> String {
        format!("{}_ANS", self.code())
    }
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A named structured parameter attached to a message or constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An emitted message: the answer key of a check plus its parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
}

impl Message {
    /// Answer message for a check that did not pass
    pub fn answer(tag: MessageTag) -> Self {
        Self {
            key: tag.answer_key(),
            params: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: Vec<Param>) -> Self {
        self.params = params;
        self
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key)?;
        if !self.params.is_empty() {
            let rendered: Vec<String> = self
                .params
                .iter()
                .map(|p| format!("{}={}", p.name, p.value))
                .collect();
            write!(f, " [{}]", rendered.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_matches_serde_name() {
        let tags = [
            MessageTag::BbbCvTspIrdof,
            MessageTag::BbbXcvIvtbctsd,
            MessageTag::PsvIpcriaidbedc,
            MessageTag::CtsSct,
            MessageTag::BbbXcvAsccm,
            MessageTag::PsvIbstbsce,
            MessageTag::TsvWacrabst,
        ];
        for tag in tags {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag.code()));
        }
    }

    #[test]
    fn test_answer_message() {
        let msg = Message::answer(MessageTag::BbbXcvIscr)
            .with_params(vec![Param::new("certificate", "C-1")]);
        assert_eq!(msg.key, "BBB_XCV_ISCR_ANS");
        assert_eq!(format!("{}", msg), "BBB_XCV_ISCR_ANS [certificate=C-1]");
    }
}
