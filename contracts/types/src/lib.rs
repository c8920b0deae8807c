#![no_std]

//! Types shared by the cross-chain name service contracts.
//!
//! The router, the receiver and the transport all speak in terms of these
//! structs, so they live in one place to keep their encodings in lockstep.

#[cfg(test)]
extern crate std;

use soroban_sdk::xdr::{FromXdr, ToXdr};
use soroban_sdk::{contracterror, contracttype, Address, Bytes, BytesN, Env, String};

/// Identifies a chain in the cross-chain transport.
pub type ChainSelector = u64;

/// Names longer than this are refused everywhere (DNS full-name limit).
pub const MAX_NAME_LENGTH: u32 = 253;

pub fn is_valid_name(name: &String) -> bool {
    let len = name.len();
    len > 0 && len <= MAX_NAME_LENGTH
}

/// Asset used to pay for cross-chain delivery.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FeeMode {
    Native,
    Link,
}

/// Where registrations for a chain go, and how much gas they get there.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChainRoute {
    pub receiver: Address,
    pub gas_limit: u64,
}

/// Payload carried from the router to the receiver.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NameRegistration {
    pub name: String,
    pub owner: Address,
}

impl NameRegistration {
    pub fn encode(&self, env: &Env) -> Bytes {
        self.clone().to_xdr(env)
    }

    /// `None` if the bytes hold a value of another shape. Bytes that are not
    /// XDR at all trap in the host.
    pub fn decode(env: &Env, payload: &Bytes) -> Option<Self> {
        Self::from_xdr(env, payload).ok()
    }
}

/// A message handed to the transport by a sending contract.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutboundMessage {
    pub destination_chain: ChainSelector,
    pub receiver: Address,
    pub payload: Bytes,
    pub fee_mode: FeeMode,
    pub gas_limit: u64,
}

/// A message handed by the transport to a receiving contract.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InboundMessage {
    pub message_id: BytesN<32>,
    pub source_chain: ChainSelector,
    pub sender: Address,
    pub payload: Bytes,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeeQuote {
    pub token: Address,
    pub amount: i128,
}

/// What the receiver did with a delivered message.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeliveryOutcome {
    /// The name was written to the local store.
    Applied,
    /// The message was consumed without effect (name already taken).
    Rejected,
}

/// Errors raised by the lookup contract. Shared so callers can tell a taken
/// name apart from a misconfigured store.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum LookupError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    DuplicateName = 4,
    NameNotFound = 5,
    InvalidName = 6,
    AuthorityNotSet = 7,
}
