#![no_std]

//! Destination-chain end of the cross-chain name service.
//!
//! The transport calls `deliver` for every inbound message. A message is
//! applied to the local lookup only if it comes from the sender trusted for
//! its source chain. A name that is already taken rejects the message without
//! failing the delivery.

#[cfg(test)]
extern crate std;

use ccns_types::{ChainSelector, DeliveryOutcome, InboundMessage, NameRegistration};
use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, log, panic_with_error,
    Address, BytesN, Env, String,
};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ReceiverError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    Unauthorized = 3,
    UntrustedSender = 4,
    InvalidPayload = 5,
    Busy = 6,
    LookupFailed = 7,
    SourceNotConfigured = 8,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReceiverState {
    Idle,
    Processing,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReceiverConfig {
    /// Only this transport may deliver messages.
    pub transport: Address,
    /// Lookup contract of this chain; this contract must be its authority.
    pub lookup: Address,
}

/// Details of the most recent delivery that got past origin checks.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReceivedMessage {
    pub message_id: BytesN<32>,
    pub source_chain: ChainSelector,
    pub sender: Address,
    pub name: String,
    pub owner: Address,
    pub outcome: DeliveryOutcome,
}

#[derive(Clone)]
#[contracttype]
enum DataKey {
    Admin,
    Config,
    State,
    TrustedSender(ChainSelector),
    LastReceived,
}

#[derive(Clone)]
#[contractevent(topics = ["name_received"])]
pub struct EvtNameReceived {
    #[topic]
    pub name: String,
    pub owner: Address,
    pub source_chain: ChainSelector,
    pub message_id: BytesN<32>,
}

#[derive(Clone)]
#[contractevent(topics = ["message_rejected"])]
pub struct EvtMessageRejected {
    #[topic]
    pub message_id: BytesN<32>,
    pub name: String,
}

#[derive(Clone)]
#[contractevent(topics = ["source_enabled"])]
pub struct EvtSourceEnabled {
    #[topic]
    pub chain_selector: ChainSelector,
    pub sender: Address,
}

#[derive(Clone)]
#[contractevent(topics = ["source_disabled"])]
pub struct EvtSourceDisabled {
    #[topic]
    pub chain_selector: ChainSelector,
}

fn read_admin(env: &Env) -> Address {
    env.storage()
        .persistent()
        .get(&DataKey::Admin)
        .unwrap_or_else(|| panic_with_error!(env, ReceiverError::NotInitialized))
}

fn read_config(env: &Env) -> ReceiverConfig {
    env.storage()
        .persistent()
        .get(&DataKey::Config)
        .unwrap_or_else(|| panic_with_error!(env, ReceiverError::NotInitialized))
}

fn read_state(env: &Env) -> ReceiverState {
    env.storage()
        .persistent()
        .get(&DataKey::State)
        .unwrap_or(ReceiverState::Idle)
}

fn write_state(env: &Env, state: ReceiverState) {
    env.storage().persistent().set(&DataKey::State, &state);
}

fn read_trusted_sender(env: &Env, chain_selector: ChainSelector) -> Option<Address> {
    env.storage()
        .persistent()
        .get(&DataKey::TrustedSender(chain_selector))
}

fn ensure_admin(env: &Env, caller: &Address) -> Result<(), ReceiverError> {
    caller.require_auth();
    if read_admin(env) != *caller {
        return Err(ReceiverError::Unauthorized);
    }
    Ok(())
}

mod lookup_api {
    use super::*;
    use ccns_types::LookupError;
    use soroban_sdk::{IntoVal, Symbol};

    /// `Ok(false)` when the name is already taken.
    pub fn register(
        env: &Env,
        lookup: &Address,
        name: &String,
        owner: &Address,
    ) -> Result<bool, ReceiverError> {
        let args = (name, owner).into_val(env);
        let func = Symbol::new(env, "register");
        match env.try_invoke_contract::<(), LookupError>(lookup, &func, args) {
            Ok(Ok(())) => Ok(true),
            Err(Ok(LookupError::DuplicateName)) => Ok(false),
            Err(Ok(LookupError::InvalidName)) => Err(ReceiverError::InvalidPayload),
            _ => Err(ReceiverError::LookupFailed),
        }
    }
}

/// Runs once the receiver is `Processing`: origin check, decode, apply.
fn process(
    env: &Env,
    config: &ReceiverConfig,
    message: &InboundMessage,
) -> Result<DeliveryOutcome, ReceiverError> {
    let trusted = read_trusted_sender(env, message.source_chain);
    if trusted.as_ref() != Some(&message.sender) {
        log!(
            env,
            "untrusted sender",
            message.source_chain,
            message.sender,
            message.message_id
        );
        return Err(ReceiverError::UntrustedSender);
    }

    // Bytes that are not XDR at all trap in the host before this returns.
    let registration = NameRegistration::decode(env, &message.payload)
        .ok_or(ReceiverError::InvalidPayload)?;

    let applied = lookup_api::register(
        env,
        &config.lookup,
        &registration.name,
        &registration.owner,
    )?;
    let outcome = if applied {
        EvtNameReceived {
            name: registration.name.clone(),
            owner: registration.owner.clone(),
            source_chain: message.source_chain,
            message_id: message.message_id.clone(),
        }
        .publish(env);
        DeliveryOutcome::Applied
    } else {
        log!(
            env,
            "name already registered, message rejected",
            registration.name,
            message.message_id
        );
        EvtMessageRejected {
            message_id: message.message_id.clone(),
            name: registration.name.clone(),
        }
        .publish(env);
        DeliveryOutcome::Rejected
    };

    env.storage().persistent().set(
        &DataKey::LastReceived,
        &ReceivedMessage {
            message_id: message.message_id.clone(),
            source_chain: message.source_chain,
            sender: message.sender.clone(),
            name: registration.name,
            owner: registration.owner,
            outcome,
        },
    );

    Ok(outcome)
}

#[contract]
pub struct Receiver;

#[contractimpl]
impl Receiver {
    pub fn version(_env: Env) -> u32 {
        1
    }

    /// One-time initializer.
    pub fn init(
        env: Env,
        admin: Address,
        transport: Address,
        lookup: Address,
    ) -> Result<(), ReceiverError> {
        let storage = env.storage().persistent();
        if storage.has(&DataKey::Admin) {
            return Err(ReceiverError::AlreadyInitialized);
        }
        storage.set(&DataKey::Admin, &admin);
        storage.set(&DataKey::Config, &ReceiverConfig { transport, lookup });
        write_state(&env, ReceiverState::Idle);
        Ok(())
    }

    pub fn admin(env: Env) -> Address {
        read_admin(&env)
    }

    pub fn config(env: Env) -> ReceiverConfig {
        read_config(&env)
    }

    pub fn state(env: Env) -> ReceiverState {
        read_state(&env)
    }

    /// Trust `sender` as the router of `chain_selector`, replacing any
    /// previously trusted one.
    pub fn enable_source(
        env: Env,
        caller: Address,
        chain_selector: ChainSelector,
        sender: Address,
    ) -> Result<(), ReceiverError> {
        ensure_admin(&env, &caller)?;
        env.storage()
            .persistent()
            .set(&DataKey::TrustedSender(chain_selector), &sender);
        EvtSourceEnabled {
            chain_selector,
            sender,
        }
        .publish(&env);
        Ok(())
    }

    pub fn disable_source(
        env: Env,
        caller: Address,
        chain_selector: ChainSelector,
    ) -> Result<(), ReceiverError> {
        ensure_admin(&env, &caller)?;
        let key = DataKey::TrustedSender(chain_selector);
        let storage = env.storage().persistent();
        if !storage.has(&key) {
            return Err(ReceiverError::SourceNotConfigured);
        }
        storage.remove(&key);

        EvtSourceDisabled { chain_selector }.publish(&env);
        Ok(())
    }

    pub fn trusted_sender(env: Env, chain_selector: ChainSelector) -> Option<Address> {
        read_trusted_sender(&env, chain_selector)
    }

    pub fn last_received(env: Env) -> Option<ReceivedMessage> {
        env.storage().persistent().get(&DataKey::LastReceived)
    }

    /// Entry point for the transport.
    pub fn deliver(env: Env, message: InboundMessage) -> Result<DeliveryOutcome, ReceiverError> {
        let config = read_config(&env);
        config.transport.require_auth();

        if read_state(&env) == ReceiverState::Processing {
            return Err(ReceiverError::Busy);
        }
        write_state(&env, ReceiverState::Processing);
        let outcome = process(&env, &config, &message);
        write_state(&env, ReceiverState::Idle);

        outcome
    }
}
