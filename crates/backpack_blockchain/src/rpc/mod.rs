//! # JSON-RPC Codec
//!
//! Request body for the items query and the decoder for its response.
//!
//! ## Response Layout
//!
//! ```text
//! {
//!   "jsonrpc": "2.0", "id": 1,
//!   "result": {
//!     "items": [
//!       { "tokenId": 3, "amount": 2, "expires": 7200 },
//!       { "tokenId": 1, "amount": 1, "expires": 9000, "owner": "0x..", "user": "0x.." }
//!     ]
//!   }
//! }
//! ```
//!
//! `owner` and `user` are optional and default to the queried holder. Any
//! malformed item rejects the whole batch: the ledger never sees a partly
//! decoded response.

use alloy_primitives::{hex, Address};
use backpack_economy::{EntitlementRecord, ItemId, Tick};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{SyncError, SyncResult};

/// JSON-RPC protocol version tag.
const JSONRPC_VERSION: &str = "2.0";

/// Call target and calldata of an `eth_call`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CallParams {
    /// Contract address.
    pub to: Address,
    /// 0x-prefixed calldata.
    pub data: String,
}

/// A JSON-RPC `eth_call` request body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RpcRequest {
    jsonrpc: &'static str,
    method: &'static str,
    params: (CallParams, &'static str),
    id: u64,
}

impl RpcRequest {
    /// Builds the `eth_call` for an items query against the latest block.
    #[must_use]
    pub fn items_query(contract: Address, calldata: &[u8], id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: "eth_call",
            params: (
                CallParams {
                    to: contract,
                    data: hex::encode_prefixed(calldata),
                },
                "latest",
            ),
            id,
        }
    }

    /// Request id, echoed by the endpoint.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

/// One entry of `result.items`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireItem {
    token_id: ItemId,
    amount: u32,
    expires: Tick,
    owner: Option<String>,
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemsResult {
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    result: Option<ItemsResult>,
    error: Option<RpcErrorObject>,
}

/// Decodes an items response into records held by `holder`.
///
/// # Errors
///
/// - `Remote` if the endpoint returned a JSON-RPC error object
/// - `Format` if the envelope or any item is malformed
pub fn decode_items(payload: &str, holder: &str) -> SyncResult<Vec<EntitlementRecord>> {
    let envelope: Envelope = serde_json::from_str(payload).map_err(|e| SyncError::Format {
        index: None,
        reason: e.to_string(),
    })?;

    if let Some(error) = envelope.error {
        return Err(SyncError::Remote {
            code: error.code,
            message: error.message,
        });
    }

    let result = envelope.result.ok_or_else(|| SyncError::Format {
        index: None,
        reason: "missing result".to_string(),
    })?;

    result
        .items
        .into_iter()
        .enumerate()
        .map(|(index, value)| -> SyncResult<EntitlementRecord> {
            let item: WireItem = serde_json::from_value(value).map_err(|e| SyncError::Format {
                index: Some(index),
                reason: e.to_string(),
            })?;
            Ok(EntitlementRecord {
                item_id: item.token_id,
                amount: item.amount,
                expires_at: item.expires,
                owner: item.owner.unwrap_or_else(|| holder.to_string()),
                user: item.user.unwrap_or_else(|| holder.to_string()),
            })
        })
        .collect()
}

/// Encodes records in the response layout [`decode_items`] reads.
#[must_use]
pub fn encode_items<'a>(records: impl IntoIterator<Item = &'a EntitlementRecord>) -> String {
    let items: Vec<Value> = records
        .into_iter()
        .map(|record| {
            json!({
                "tokenId": record.item_id,
                "amount": record.amount,
                "expires": record.expires_at,
                "owner": record.owner,
                "user": record.user,
            })
        })
        .collect();

    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": 1,
        "result": { "items": items },
    })
    .to_string()
}
