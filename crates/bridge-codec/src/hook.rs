//! Completion-hook memos for relayed transfers into the Hub
//!
//! A transfer arriving over the relay transport carries its onward
//! instruction as a JSON memo with a base64 blob of an encoded
//! [`CompletionHookCall`]:
//! ```text
//! incentivized source: {"eibc":{"fee":"<amount>","dym_on_completion":"<b64>"}}
//! relayed source:      {"on_completion":"<b64>"}
//! ```
//!
//! A plain incentivized withdrawal that stops on the Hub carries only the
//! fulfiller fee: `{"eibc":{"fee":"<amount>"}}`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::messages::{CompletionHookCall, ForwardToDirectChain, ForwardToIndirectChain};

/// Hub hook that continues a transfer over the envelope protocol
pub const HOOK_FORWARD_TO_DIRECT: &str = "dym-hl-forward";
/// Hub hook that continues a transfer over the relay transport
pub const HOOK_FORWARD_TO_INDIRECT: &str = "dym-ibc-forward";

impl CompletionHookCall {
    pub fn forward_to_direct(forward: &ForwardToDirectChain) -> Self {
        Self {
            name: HOOK_FORWARD_TO_DIRECT.to_string(),
            data: forward.encode(),
        }
    }

    pub fn forward_to_indirect(forward: &ForwardToIndirectChain) -> Self {
        Self {
            name: HOOK_FORWARD_TO_INDIRECT.to_string(),
            data: forward.encode(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct EibcSection {
    fee: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dym_on_completion: Option<String>,
}

fn to_memo_string(json: &MemoJson) -> Result<String, CodecError> {
    serde_json::to_string(json)
        .map_err(|e| CodecError::malformed("completion memo", e.to_string()))
}

/// Memo for an incentivized withdrawal into the Hub with no onward hop
pub fn withdrawal_memo(fee: &BigUint) -> Result<String, CodecError> {
    to_memo_string(&MemoJson::Eibc {
        eibc: EibcSection {
            fee: fee.to_string(),
            dym_on_completion: None,
        },
    })
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum MemoJson {
    Eibc { eibc: EibcSection },
    Relayed { on_completion: String },
}

/// Onward instruction attached to a relayed transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionMemo {
    /// Incentivized withdrawal: fulfiller fee plus the hook to run on completion
    Incentivized {
        fee: BigUint,
        call: CompletionHookCall,
    },
    /// Plain relayed transfer
    Relayed { call: CompletionHookCall },
}

impl CompletionMemo {
    pub fn call(&self) -> &CompletionHookCall {
        match self {
            Self::Incentivized { call, .. } | Self::Relayed { call } => call,
        }
    }

    pub fn to_json(&self) -> Result<String, CodecError> {
        let json = match self {
            Self::Incentivized { fee, call } => MemoJson::Eibc {
                eibc: EibcSection {
                    fee: fee.to_string(),
                    dym_on_completion: Some(BASE64.encode(call.encode())),
                },
            },
            Self::Relayed { call } => MemoJson::Relayed {
                on_completion: BASE64.encode(call.encode()),
            },
        };
        to_memo_string(&json)
    }

    pub fn from_json(memo: &str) -> Result<Self, CodecError> {
        let json: MemoJson = serde_json::from_str(memo)
            .map_err(|e| CodecError::malformed("completion memo", e.to_string()))?;

        let decode_call = |blob: &str| -> Result<CompletionHookCall, CodecError> {
            let bytes = BASE64
                .decode(blob)
                .map_err(|e| CodecError::malformed("completion memo", format!("base64: {e}")))?;
            CompletionHookCall::decode(&bytes)
        };

        match json {
            MemoJson::Eibc { eibc } => Ok(Self::Incentivized {
                fee: eibc.fee.parse::<BigUint>().map_err(|e| {
                    CodecError::malformed("completion memo", format!("fee: {e}"))
                })?,
                call: decode_call(eibc.dym_on_completion.as_deref().ok_or_else(|| {
                    CodecError::malformed("completion memo", "missing dym_on_completion")
                })?)?,
            }),
            MemoJson::Relayed { on_completion } => Ok(Self::Relayed {
                call: decode_call(&on_completion)?,
            }),
        }
    }
}
