#![no_std]

//! Local cross-chain transport.
//!
//! Stands in for the relay network when every chain lives in the same
//! environment: source and destination share one chain selector, and messages
//! sit in a queue until someone calls `deliver`. Failed executions stay queued
//! so they can be re-executed once the receiving side is fixed.

#[cfg(test)]
extern crate std;

use ccns_types::{
    ChainSelector, DeliveryOutcome, FeeMode, FeeQuote, InboundMessage, OutboundMessage,
};
use soroban_sdk::xdr::ToXdr;
use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, log, panic_with_error,
    token, Address, Bytes, BytesN, Env, Vec,
};

/// Highest gas limit a message may request.
pub const MAX_GAS_LIMIT: u64 = 3_000_000;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum SimulatorError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    Unauthorized = 3,
    UnsupportedChain = 4,
    GasLimitTooHigh = 5,
    MessageNotFound = 6,
    AlreadyFinalized = 7,
    InvalidFee = 8,
    InsufficientFee = 9,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SimulatorConfig {
    pub chain_selector: ChainSelector,
    /// Router address for both the source and the destination side.
    pub router: Address,
    pub native_token: Address,
    pub link_token: Address,
    pub max_gas_limit: u64,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageStatus {
    Pending,
    Delivered,
    Rejected,
    Failed,
}

impl MessageStatus {
    fn is_final(self) -> bool {
        matches!(self, MessageStatus::Delivered | MessageStatus::Rejected)
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Envelope {
    pub message_id: BytesN<32>,
    pub source_chain: ChainSelector,
    pub sender: Address,
    pub message: OutboundMessage,
    pub fee: FeeQuote,
    pub status: MessageStatus,
    /// Contract error code of the receiver's last failed execution.
    pub last_error: Option<u32>,
}

#[derive(Clone)]
#[contracttype]
enum DataKey {
    Admin,
    Config,
    Fee(FeeMode),
    Nonce,
    Message(BytesN<32>),
    Pending,
}

#[derive(Clone)]
#[contractevent(topics = ["message_sent"])]
pub struct EvtMessageSent {
    #[topic]
    pub message_id: BytesN<32>,
    pub sender: Address,
    pub receiver: Address,
    pub destination_chain: ChainSelector,
}

#[derive(Clone)]
#[contractevent(topics = ["message_delivered"])]
pub struct EvtMessageDelivered {
    #[topic]
    pub message_id: BytesN<32>,
    pub status: MessageStatus,
    pub error: Option<u32>,
}

fn read_admin(env: &Env) -> Address {
    env.storage()
        .persistent()
        .get(&DataKey::Admin)
        .unwrap_or_else(|| panic_with_error!(env, SimulatorError::NotInitialized))
}

fn read_config(env: &Env) -> SimulatorConfig {
    env.storage()
        .persistent()
        .get(&DataKey::Config)
        .unwrap_or_else(|| panic_with_error!(env, SimulatorError::NotInitialized))
}

fn read_envelope(env: &Env, message_id: &BytesN<32>) -> Option<Envelope> {
    env.storage()
        .persistent()
        .get(&DataKey::Message(message_id.clone()))
}

fn write_envelope(env: &Env, envelope: &Envelope) {
    env.storage()
        .persistent()
        .set(&DataKey::Message(envelope.message_id.clone()), envelope);
}

fn read_pending(env: &Env) -> Vec<BytesN<32>> {
    env.storage()
        .persistent()
        .get(&DataKey::Pending)
        .unwrap_or_else(|| Vec::new(env))
}

fn write_pending(env: &Env, pending: &Vec<BytesN<32>>) {
    env.storage().persistent().set(&DataKey::Pending, pending);
}

fn next_nonce(env: &Env) -> u64 {
    let storage = env.storage().persistent();
    let nonce: u64 = storage.get(&DataKey::Nonce).unwrap_or(0);
    storage.set(&DataKey::Nonce, &(nonce + 1));
    nonce
}

fn compute_message_id(
    env: &Env,
    nonce: u64,
    sender: &Address,
    message: &OutboundMessage,
) -> BytesN<32> {
    let mut data = Bytes::new(env);
    data.append(&nonce.to_xdr(env));
    data.append(&sender.clone().to_xdr(env));
    data.append(&message.clone().to_xdr(env));
    env.crypto().sha256(&data).to_bytes()
}

fn quote(env: &Env, fee_mode: FeeMode) -> FeeQuote {
    let config = read_config(env);
    let token = match fee_mode {
        FeeMode::Native => config.native_token,
        FeeMode::Link => config.link_token,
    };
    let amount = env
        .storage()
        .persistent()
        .get(&DataKey::Fee(fee_mode))
        .unwrap_or(0);
    FeeQuote { token, amount }
}

mod receiver_api {
    use super::*;
    use soroban_sdk::{xdr::ScErrorType, Error, IntoVal, Symbol};

    /// On failure, the receiver's contract error code if it returned one.
    pub fn deliver(
        env: &Env,
        receiver: &Address,
        message: &InboundMessage,
    ) -> Result<DeliveryOutcome, Option<u32>> {
        let args = (message,).into_val(env);
        match env.try_invoke_contract::<DeliveryOutcome, Error>(
            receiver,
            &Symbol::new(env, "deliver"),
            args,
        ) {
            Ok(Ok(outcome)) => Ok(outcome),
            Err(Ok(err)) if err.is_type(ScErrorType::Contract) => Err(Some(err.get_code())),
            _ => Err(None),
        }
    }
}

/// Pulls the quoted fee from `sender` into the transport.
fn collect_fee(env: &Env, sender: &Address, fee: &FeeQuote) -> Result<(), SimulatorError> {
    if fee.amount == 0 {
        return Ok(());
    }
    let token = token::TokenClient::new(env, &fee.token);
    if token.balance(sender) < fee.amount {
        return Err(SimulatorError::InsufficientFee);
    }
    token.transfer(sender, &env.current_contract_address(), &fee.amount);
    Ok(())
}

fn execute(env: &Env, message_id: &BytesN<32>) -> Result<MessageStatus, SimulatorError> {
    let mut envelope = read_envelope(env, message_id).ok_or(SimulatorError::MessageNotFound)?;
    if envelope.status.is_final() {
        return Err(SimulatorError::AlreadyFinalized);
    }

    let inbound = InboundMessage {
        message_id: envelope.message_id.clone(),
        source_chain: envelope.source_chain,
        sender: envelope.sender.clone(),
        payload: envelope.message.payload.clone(),
    };
    let (status, last_error) =
        match receiver_api::deliver(env, &envelope.message.receiver, &inbound) {
            Ok(DeliveryOutcome::Applied) => (MessageStatus::Delivered, None),
            Ok(DeliveryOutcome::Rejected) => (MessageStatus::Rejected, None),
            Err(code) => {
                log!(
                    env,
                    "execution failed",
                    envelope.message_id,
                    envelope.message.receiver,
                    code
                );
                (MessageStatus::Failed, code)
            }
        };
    envelope.status = status;
    envelope.last_error = last_error;
    write_envelope(env, &envelope);

    if envelope.status.is_final() {
        let mut pending = read_pending(env);
        if let Some(idx) = pending.first_index_of(message_id) {
            pending.remove(idx);
            write_pending(env, &pending);
        }
    }

    EvtMessageDelivered {
        message_id: envelope.message_id,
        status: envelope.status,
        error: envelope.last_error,
    }
    .publish(env);
    Ok(envelope.status)
}

#[contract]
pub struct Simulator;

#[contractimpl]
impl Simulator {
    pub fn version(_env: Env) -> u32 {
        1
    }

    /// One-time initializer.
    pub fn init(
        env: Env,
        admin: Address,
        chain_selector: ChainSelector,
        native_token: Address,
        link_token: Address,
    ) -> Result<(), SimulatorError> {
        let storage = env.storage().persistent();
        if storage.has(&DataKey::Admin) {
            return Err(SimulatorError::AlreadyInitialized);
        }
        storage.set(&DataKey::Admin, &admin);
        storage.set(
            &DataKey::Config,
            &SimulatorConfig {
                chain_selector,
                router: env.current_contract_address(),
                native_token,
                link_token,
                max_gas_limit: MAX_GAS_LIMIT,
            },
        );
        Ok(())
    }

    pub fn configuration(env: Env) -> SimulatorConfig {
        read_config(&env)
    }

    pub fn is_chain_supported(env: Env, chain_selector: ChainSelector) -> bool {
        read_config(&env).chain_selector == chain_selector
    }

    /// Flat per-message fee for `fee_mode` (admin only).
    pub fn set_fee(
        env: Env,
        caller: Address,
        fee_mode: FeeMode,
        amount: i128,
    ) -> Result<(), SimulatorError> {
        caller.require_auth();
        if read_admin(&env) != caller {
            return Err(SimulatorError::Unauthorized);
        }
        if amount < 0 {
            return Err(SimulatorError::InvalidFee);
        }
        env.storage()
            .persistent()
            .set(&DataKey::Fee(fee_mode), &amount);
        Ok(())
    }

    pub fn get_fee(env: Env, message: OutboundMessage) -> FeeQuote {
        quote(&env, message.fee_mode)
    }

    /// Collect the quoted fee from `sender`, queue `message` for delivery and
    /// return its id.
    pub fn ccip_send(
        env: Env,
        sender: Address,
        message: OutboundMessage,
    ) -> Result<BytesN<32>, SimulatorError> {
        sender.require_auth();
        let config = read_config(&env);
        if message.destination_chain != config.chain_selector {
            return Err(SimulatorError::UnsupportedChain);
        }
        if message.gas_limit > config.max_gas_limit {
            return Err(SimulatorError::GasLimitTooHigh);
        }

        let fee = quote(&env, message.fee_mode);
        collect_fee(&env, &sender, &fee)?;

        let nonce = next_nonce(&env);
        let message_id = compute_message_id(&env, nonce, &sender, &message);
        let envelope = Envelope {
            message_id: message_id.clone(),
            source_chain: config.chain_selector,
            sender: sender.clone(),
            fee,
            message,
            status: MessageStatus::Pending,
            last_error: None,
        };
        write_envelope(&env, &envelope);

        let mut pending = read_pending(&env);
        pending.push_back(message_id.clone());
        write_pending(&env, &pending);

        EvtMessageSent {
            message_id: message_id.clone(),
            sender,
            receiver: envelope.message.receiver,
            destination_chain: envelope.message.destination_chain,
        }
        .publish(&env);
        Ok(message_id)
    }

    /// Execute a pending (or previously failed) message against its receiver.
    pub fn deliver(env: Env, message_id: BytesN<32>) -> Result<MessageStatus, SimulatorError> {
        read_config(&env);
        execute(&env, &message_id)
    }

    /// Execute every queued message; returns how many were attempted.
    pub fn deliver_all(env: Env) -> Result<u32, SimulatorError> {
        let pending = read_pending(&env);
        for message_id in pending.iter() {
            execute(&env, &message_id)?;
        }
        Ok(pending.len())
    }

    pub fn message(env: Env, message_id: BytesN<32>) -> Option<Envelope> {
        read_envelope(&env, &message_id)
    }

    pub fn pending(env: Env) -> Vec<BytesN<32>> {
        read_pending(&env)
    }
}
