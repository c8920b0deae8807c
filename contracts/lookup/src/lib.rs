#![no_std]

//! Name registry and lookup for one chain.
//!
//! Records are written only by the configured authority: the register contract
//! on the source chain, or the receiver contract on a destination chain.
//! Anyone can read them.

#[cfg(test)]
extern crate std;

use ccns_types::{is_valid_name, LookupError};
use soroban_sdk::{
    contract, contractevent, contractimpl, contracttype, panic_with_error, Address, Env, String,
};

#[derive(Clone)]
#[contracttype]
enum DataKey {
    Admin,
    Authority,
    Record(String),
}

#[derive(Clone)]
#[contractevent(topics = ["name_registered"])]
pub struct EvtNameRegistered {
    #[topic]
    pub name: String,
    pub owner: Address,
}

#[derive(Clone)]
#[contractevent(topics = ["authority_set"])]
pub struct EvtAuthoritySet {
    pub authority: Address,
}

/// Name -> owner records. Insert-only.
mod store {
    use super::*;

    pub fn get(env: &Env, name: &String) -> Option<Address> {
        env.storage()
            .persistent()
            .get(&DataKey::Record(name.clone()))
    }

    pub fn contains(env: &Env, name: &String) -> bool {
        env.storage()
            .persistent()
            .has(&DataKey::Record(name.clone()))
    }

    pub fn insert(env: &Env, name: &String, owner: &Address) -> Result<(), LookupError> {
        if !is_valid_name(name) {
            return Err(LookupError::InvalidName);
        }
        if contains(env, name) {
            return Err(LookupError::DuplicateName);
        }
        env.storage()
            .persistent()
            .set(&DataKey::Record(name.clone()), owner);
        Ok(())
    }
}

fn read_admin(env: &Env) -> Address {
    env.storage()
        .persistent()
        .get(&DataKey::Admin)
        .unwrap_or_else(|| panic_with_error!(env, LookupError::NotInitialized))
}

fn read_authority(env: &Env) -> Option<Address> {
    env.storage().persistent().get(&DataKey::Authority)
}

fn ensure_initialized(env: &Env) {
    if !env.storage().persistent().has(&DataKey::Admin) {
        panic_with_error!(env, LookupError::NotInitialized);
    }
}

fn ensure_admin(env: &Env, caller: &Address) -> Result<(), LookupError> {
    if read_admin(env) != *caller {
        return Err(LookupError::Unauthorized);
    }
    Ok(())
}

#[contract]
pub struct Lookup;

#[contractimpl]
impl Lookup {
    pub fn version(_env: Env) -> u32 {
        1
    }

    /// One-time initializer.
    pub fn init(env: Env, admin: Address) -> Result<(), LookupError> {
        let storage = env.storage().persistent();
        if storage.has(&DataKey::Admin) {
            return Err(LookupError::AlreadyInitialized);
        }
        storage.set(&DataKey::Admin, &admin);
        Ok(())
    }

    pub fn admin(env: Env) -> Address {
        read_admin(&env)
    }

    /// Hand write access to the contract that holds registry authority on
    /// this chain (admin only).
    pub fn set_authority(env: Env, caller: Address, authority: Address) -> Result<(), LookupError> {
        caller.require_auth();
        ensure_admin(&env, &caller)?;
        env.storage()
            .persistent()
            .set(&DataKey::Authority, &authority);
        EvtAuthoritySet { authority }.publish(&env);
        Ok(())
    }

    pub fn authority(env: Env) -> Option<Address> {
        read_authority(&env)
    }

    pub fn register(env: Env, name: String, owner: Address) -> Result<(), LookupError> {
        ensure_initialized(&env);
        let authority = read_authority(&env).ok_or(LookupError::AuthorityNotSet)?;
        authority.require_auth();

        store::insert(&env, &name, &owner)?;

        EvtNameRegistered { name, owner }.publish(&env);
        Ok(())
    }

    pub fn lookup(env: Env, name: String) -> Result<Address, LookupError> {
        store::get(&env, &name).ok_or(LookupError::NameNotFound)
    }

    pub fn is_registered(env: Env, name: String) -> bool {
        store::contains(&env, &name)
    }
}
