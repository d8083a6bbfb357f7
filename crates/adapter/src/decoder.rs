//! Normalizes raw chain action records into canonical cross-chain events.
//!
//! Pure and deterministic given the parameters table: no network, no
//! clock beyond the timestamp embedded in each record. One malformed
//! record is logged and skipped; it never poisons the batch.

use serde_json::{Map, Value};
use storeman_bridge_chainio::types::{parse_chain_timestamp, RawActionRecord};
use storeman_bridge_primitives::{
    events::{CanonicalEvent, EventArgs, EventKind, InlockArgs, LockValue},
    helpers::hex_add_0x,
    params::ChainParams,
    types::{ChainKind, Role},
};
use thiserror::Error;
use tracing::error;

/// Memo tag marking an inbound lock.
const INLOCK_TAG: &str = "inlock";

/// `inlock:<xhash>:<wanaddr>:<storeman>:<reserved>`
const INLOCK_MEMO_PARTS: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum DecodeError {
    #[error("missing or malformed field `{0}`")]
    Field(&'static str),
    #[error("{0}")]
    Timestamp(String),
}

/// Decodes a batch of raw action records, preserving input order.
///
/// Records that match no recognized shape are dropped; records that fail
/// mid-decode are logged with the offending record and skipped.
pub fn decode_actions(
    params: &ChainParams,
    chain: ChainKind,
    role: Role,
    actions: &[RawActionRecord],
) -> Vec<CanonicalEvent> {
    let mut events = Vec::with_capacity(actions.len());

    for record in actions {
        match decode_record(params, role, record) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {}
            Err(err) => {
                error!(%chain, %err, ?record, "skipping action record that failed to decode");
            }
        }
    }

    events
}

fn decode_record(
    params: &ChainParams,
    role: Role,
    record: &RawActionRecord,
) -> Result<Option<CanonicalEvent>, DecodeError> {
    let act = record.act();
    let timestamp = parse_chain_timestamp(&record.block_time)
        .map_err(|err| DecodeError::Timestamp(err.to_string()))?;

    if params.deposit_action() == Some(act.name.as_str()) {
        return decode_deposit(params, role, record, timestamp);
    }

    // every other recognized action passes through with light
    // normalization of its payload
    let args = match &act.data {
        Value::Object(map) if !map.is_empty() => Value::Object(normalize_payload(map)),
        Value::String(payload) if !payload.is_empty() => Value::String(payload.clone()),
        _ => return Ok(None),
    };

    Ok(Some(CanonicalEvent {
        address: act.account.clone(),
        block_number: record.block_num,
        transaction_hash: record.trx_id().to_string(),
        timestamp,
        kind: params.classify(&act.name),
        name: act.name.clone(),
        args: EventArgs::Raw(args),
    }))
}

fn decode_deposit(
    params: &ChainParams,
    role: Role,
    record: &RawActionRecord,
    timestamp: i64,
) -> Result<Option<CanonicalEvent>, DecodeError> {
    let act = record.act();
    let data = act.data.as_object().ok_or(DecodeError::Field("data"))?;
    let memo = field_str(data, "memo")?;
    let parts: Vec<&str> = memo.split(':').collect();

    if parts.len() == INLOCK_MEMO_PARTS && parts[0] == INLOCK_TAG {
        let value = if let Some(quantity) = data.get("quantity").and_then(Value::as_str) {
            LockValue::Quantity(quantity.to_string())
        } else if let Some(amount) = data.get("amount").and_then(Value::as_u64) {
            LockValue::Amount {
                amount,
                symbol: field_str(data, "symbol")?.to_string(),
            }
        } else {
            return Err(DecodeError::Field("quantity"));
        };

        let token_orig_account = value
            .token_orig_account(&act.account)
            .ok_or(DecodeError::Field("quantity"))?;

        return Ok(Some(CanonicalEvent {
            address: act.account.clone(),
            block_number: record.block_num,
            transaction_hash: record.trx_id().to_string(),
            timestamp,
            kind: EventKind::Deposit,
            name: act.name.clone(),
            args: EventArgs::Inlock(InlockArgs {
                user: field_str(data, "from")?.to_string(),
                to_htlc_addr: field_str(data, "to")?.to_string(),
                storeman: hex_add_0x(parts[3]),
                x_hash: hex_add_0x(parts[1]),
                wan_addr: hex_add_0x(parts[2]),
                value,
                token_orig_account,
            }),
        }));
    }

    // fee withdrawals ride the lock action as a single-part memo; only the
    // leader reports them
    if role.is_leader() && parts.len() == 1 && parts[0] == params.withdraw_fee_action {
        return Ok(Some(CanonicalEvent {
            address: act.account.clone(),
            block_number: record.block_num,
            transaction_hash: record.trx_id().to_string(),
            timestamp,
            kind: EventKind::WithdrawFee,
            name: memo.to_string(),
            args: EventArgs::Raw(act.data.clone()),
        }));
    }

    Ok(None)
}

/// Hex-prefixes `xHash`/`x` and copies `quantity`/`amount` into a
/// canonical `value` field.
fn normalize_payload(data: &Map<String, Value>) -> Map<String, Value> {
    let mut data = data.clone();

    for key in ["xHash", "x"] {
        if let Some(hexs) = data.get(key).and_then(Value::as_str) {
            let prefixed = hex_add_0x(hexs);
            data.insert(key.to_string(), Value::String(prefixed));
        }
    }

    if let Some(quantity) = data.get("quantity").cloned() {
        data.insert("value".to_string(), quantity);
    }
    if let Some(amount) = data.get("amount").cloned() {
        data.insert("value".to_string(), amount);
    }

    data
}

fn field_str<'a>(
    data: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a str, DecodeError> {
    data.get(key)
        .and_then(Value::as_str)
        .ok_or(DecodeError::Field(key))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use storeman_bridge_chainio::types::{ActionBody, ActionEntry, ActionTrace};

    use super::*;

    fn eos_params() -> ChainParams {
        ChainParams {
            deposit_actions: vec!["transfer".to_string()],
            withdraw_actions: vec!["outlock".to_string()],
            debt_actions: vec!["lockdebt".to_string()],
            withdraw_fee_action: "withdrawfee".to_string(),
            htlc_account: "htlceos".to_string(),
        }
    }

    fn record(account: &str, name: &str, data: Value) -> RawActionRecord {
        RawActionRecord {
            global_action_seq: None,
            block_num: 100,
            block_time: "2019-07-01T12:00:00.500".to_string(),
            body: ActionBody::Trace {
                action_trace: ActionTrace {
                    act: ActionEntry {
                        account: account.to_string(),
                        name: name.to_string(),
                        authorization: vec![],
                        data,
                    },
                    trx_id: "deadbeef".to_string(),
                },
            },
        }
    }

    fn inlock_record(account: &str) -> RawActionRecord {
        record(
            account,
            "transfer",
            json!({
                "from": "alice",
                "to": "htlceos",
                "quantity": "5.0000 EOS",
                "memo": "inlock:aa11:0xdead:smg1:reserved"
            }),
        )
    }

    #[test]
    fn inlock_memo_decodes_to_deposit_event() {
        let events = decode_actions(
            &eos_params(),
            ChainKind::Eos,
            Role::Follower,
            &[inlock_record("eosio.token")],
        );

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.kind, EventKind::Deposit);
        assert_eq!(event.address, "eosio.token");
        assert_eq!(event.block_number, 100);
        assert_eq!(event.transaction_hash, "deadbeef");
        assert_eq!(event.timestamp, 1561982400);

        let EventArgs::Inlock(args) = &event.args else {
            panic!("expected inlock args");
        };
        assert_eq!(args.user, "alice");
        assert_eq!(args.to_htlc_addr, "htlceos");
        assert_eq!(args.storeman, "0xsmg1");
        assert_eq!(args.x_hash, "0xaa11");
        assert_eq!(args.wan_addr, "0xdead");
        assert_eq!(args.value, LockValue::Quantity("5.0000 EOS".to_string()));
        assert_eq!(args.token_orig_account, "eosio.token:EOS");
    }

    #[test]
    fn amount_and_symbol_are_the_other_value_representation() {
        let rec = record(
            "eosio.token",
            "transfer",
            json!({
                "from": "alice",
                "to": "htlceos",
                "amount": 50000,
                "symbol": "EOS",
                "memo": "inlock:aa11:0xdead:smg1:reserved"
            }),
        );

        let events = decode_actions(&eos_params(), ChainKind::Eos, Role::Follower, &[rec]);

        let EventArgs::Inlock(args) = &events[0].args else {
            panic!("expected inlock args");
        };
        assert_eq!(
            args.value,
            LockValue::Amount {
                amount: 50000,
                symbol: "EOS".to_string()
            }
        );
        assert_eq!(args.token_orig_account, "eosio.token:EOS");
    }

    #[test]
    fn leader_emits_fee_withdrawal_and_follower_drops_it() {
        let rec = record(
            "eosio.token",
            "transfer",
            json!({
                "from": "storeman",
                "to": "htlceos",
                "quantity": "1.0000 EOS",
                "memo": "withdrawfee"
            }),
        );

        let as_leader = decode_actions(
            &eos_params(),
            ChainKind::Eos,
            Role::Leader,
            std::slice::from_ref(&rec),
        );
        assert_eq!(as_leader.len(), 1);
        assert_eq!(as_leader[0].kind, EventKind::WithdrawFee);
        assert_eq!(as_leader[0].name, "withdrawfee");
        assert_eq!(
            as_leader[0].args,
            EventArgs::Raw(rec.act().data.clone())
        );

        let as_follower = decode_actions(&eos_params(), ChainKind::Eos, Role::Follower, &[rec]);
        assert!(as_follower.is_empty());
    }

    #[test]
    fn unrecognized_deposit_memo_is_dropped() {
        let rec = record(
            "eosio.token",
            "transfer",
            json!({
                "from": "alice",
                "to": "bob",
                "quantity": "5.0000 EOS",
                "memo": "just paying rent"
            }),
        );

        let events = decode_actions(&eos_params(), ChainKind::Eos, Role::Leader, &[rec]);
        assert!(events.is_empty());
    }

    #[test]
    fn one_malformed_record_does_not_poison_the_batch() {
        let bad = record("eosio.token", "transfer", json!({"from": "alice"}));
        let batch = [
            inlock_record("eosio.token"),
            bad,
            inlock_record("tethertether"),
        ];

        let events = decode_actions(&eos_params(), ChainKind::Eos, Role::Follower, &batch);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].address, "eosio.token");
        assert_eq!(events[1].address, "tethertether");
    }

    #[test]
    fn passthrough_payload_is_normalized() {
        let rec = record(
            "htlceos",
            "outlock",
            json!({
                "xHash": "aa11",
                "x": "0xbb22",
                "quantity": "2.0000 EOS",
                "user": "alice"
            }),
        );

        let events = decode_actions(&eos_params(), ChainKind::Eos, Role::Follower, &[rec]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Withdraw);
        let EventArgs::Raw(Value::Object(data)) = &events[0].args else {
            panic!("expected raw object args");
        };
        assert_eq!(data["xHash"], "0xaa11");
        assert_eq!(data["x"], "0xbb22");
        assert_eq!(data["value"], "2.0000 EOS");
        assert_eq!(data["user"], "alice");
    }

    #[test]
    fn empty_payloads_are_dropped() {
        let empty_obj = record("htlceos", "outlock", json!({}));
        let null_data = record("htlceos", "lockdebt", Value::Null);

        let events =
            decode_actions(&eos_params(), ChainKind::Eos, Role::Follower, &[empty_obj, null_data]);
        assert!(events.is_empty());
    }

    #[test]
    fn decoding_is_deterministic_and_order_preserving() {
        let batch = [
            inlock_record("eosio.token"),
            record("htlceos", "outlock", json!({"xHash": "cc33"})),
            inlock_record("tethertether"),
        ];

        let first = decode_actions(&eos_params(), ChainKind::Eos, Role::Follower, &batch);
        let second = decode_actions(&eos_params(), ChainKind::Eos, Role::Follower, &batch);

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].address, "eosio.token");
        assert_eq!(first[1].address, "htlceos");
        assert_eq!(first[2].address, "tethertether");
    }
}
