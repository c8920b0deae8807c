#![no_std]

//! Source-chain entry point of the cross-chain name service.
//!
//! `register` records the name in the local lookup, then sends it to the
//! receiver enabled for the target chain through the transport. Delivery on
//! the other side is the transport's business.

#[cfg(test)]
extern crate std;

use ccns_types::{
    is_valid_name, ChainRoute, ChainSelector, FeeMode, FeeQuote, NameRegistration, OutboundMessage,
};
use soroban_sdk::{
    auth::{ContractContext, InvokerContractAuthEntry, SubContractInvocation},
    contract, contracterror, contractevent, contractimpl, contracttype, log, panic_with_error,
    token, vec, Address, BytesN, Env, IntoVal, String, Symbol,
};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum RegisterError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    Unauthorized = 3,
    RouteNotConfigured = 4,
    DuplicateName = 5,
    InvalidName = 6,
    InvalidGasLimit = 7,
    InsufficientFeeBalance = 8,
    LookupFailed = 9,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegisterConfig {
    /// Cross-chain transport (router) messages are handed to.
    pub transport: Address,
    /// Lookup contract of this chain; this contract must be its authority.
    pub lookup: Address,
    /// Chain every registration is sent to.
    pub target_chain: ChainSelector,
    pub fee_mode: FeeMode,
}

#[derive(Clone)]
#[contracttype]
enum DataKey {
    Admin,
    Config,
    Route(ChainSelector),
}

#[derive(Clone)]
#[contractevent(topics = ["chain_enabled"])]
pub struct EvtChainEnabled {
    #[topic]
    pub chain_selector: ChainSelector,
    pub receiver: Address,
    pub gas_limit: u64,
}

#[derive(Clone)]
#[contractevent(topics = ["chain_disabled"])]
pub struct EvtChainDisabled {
    #[topic]
    pub chain_selector: ChainSelector,
}

#[derive(Clone)]
#[contractevent(topics = ["registration_sent"])]
pub struct EvtRegistrationSent {
    #[topic]
    pub name: String,
    pub owner: Address,
    pub destination_chain: ChainSelector,
    pub message_id: BytesN<32>,
}

fn read_admin(env: &Env) -> Address {
    env.storage()
        .persistent()
        .get(&DataKey::Admin)
        .unwrap_or_else(|| panic_with_error!(env, RegisterError::NotInitialized))
}

fn read_config(env: &Env) -> RegisterConfig {
    env.storage()
        .persistent()
        .get(&DataKey::Config)
        .unwrap_or_else(|| panic_with_error!(env, RegisterError::NotInitialized))
}

fn write_config(env: &Env, config: &RegisterConfig) {
    env.storage().persistent().set(&DataKey::Config, config);
}

fn read_route(env: &Env, chain_selector: ChainSelector) -> Option<ChainRoute> {
    env.storage()
        .persistent()
        .get(&DataKey::Route(chain_selector))
}

fn ensure_admin(env: &Env, caller: &Address) -> Result<(), RegisterError> {
    caller.require_auth();
    if read_admin(env) != *caller {
        return Err(RegisterError::Unauthorized);
    }
    Ok(())
}

mod lookup_api {
    use super::*;
    use ccns_types::LookupError;

    pub fn register(
        env: &Env,
        lookup: &Address,
        name: &String,
        owner: &Address,
    ) -> Result<(), RegisterError> {
        let args = (name, owner).into_val(env);
        let func = Symbol::new(env, "register");
        match env.try_invoke_contract::<(), LookupError>(lookup, &func, args) {
            Ok(Ok(())) => Ok(()),
            Err(Ok(LookupError::DuplicateName)) => Err(RegisterError::DuplicateName),
            Err(Ok(LookupError::InvalidName)) => Err(RegisterError::InvalidName),
            _ => Err(RegisterError::LookupFailed),
        }
    }
}

mod transport_api {
    use super::*;

    pub fn get_fee(env: &Env, transport: &Address, message: &OutboundMessage) -> FeeQuote {
        env.invoke_contract(
            transport,
            &Symbol::new(env, "get_fee"),
            (message,).into_val(env),
        )
    }

    pub fn ccip_send(env: &Env, transport: &Address, message: &OutboundMessage) -> BytesN<32> {
        env.invoke_contract(
            transport,
            &Symbol::new(env, "ccip_send"),
            (env.current_contract_address(), message).into_val(env),
        )
    }
}

/// Lets the transport pull the quoted fee out of this contract's balance
/// during the `ccip_send` that follows.
fn authorize_fee(env: &Env, transport: &Address, quote: &FeeQuote) -> Result<(), RegisterError> {
    if quote.amount <= 0 {
        return Ok(());
    }
    let this = env.current_contract_address();
    let token = token::TokenClient::new(env, &quote.token);
    if token.balance(&this) < quote.amount {
        return Err(RegisterError::InsufficientFeeBalance);
    }
    env.authorize_as_current_contract(vec![
        env,
        InvokerContractAuthEntry::Contract(SubContractInvocation {
            context: ContractContext {
                contract: quote.token.clone(),
                fn_name: Symbol::new(env, "transfer"),
                args: (this, transport.clone(), quote.amount).into_val(env),
            },
            sub_invocations: vec![env],
        }),
    ]);
    Ok(())
}

#[contract]
pub struct Register;

#[contractimpl]
impl Register {
    pub fn version(_env: Env) -> u32 {
        1
    }

    /// One-time initializer.
    pub fn init(
        env: Env,
        admin: Address,
        transport: Address,
        lookup: Address,
        target_chain: ChainSelector,
        fee_mode: FeeMode,
    ) -> Result<(), RegisterError> {
        let storage = env.storage().persistent();
        if storage.has(&DataKey::Admin) {
            return Err(RegisterError::AlreadyInitialized);
        }
        storage.set(&DataKey::Admin, &admin);
        write_config(
            &env,
            &RegisterConfig {
                transport,
                lookup,
                target_chain,
                fee_mode,
            },
        );
        Ok(())
    }

    pub fn admin(env: Env) -> Address {
        read_admin(&env)
    }

    pub fn config(env: Env) -> RegisterConfig {
        read_config(&env)
    }

    /// Set (or overwrite) the route to `chain_selector`.
    pub fn enable_chain(
        env: Env,
        caller: Address,
        chain_selector: ChainSelector,
        receiver: Address,
        gas_limit: u64,
    ) -> Result<(), RegisterError> {
        ensure_admin(&env, &caller)?;
        if gas_limit == 0 {
            return Err(RegisterError::InvalidGasLimit);
        }
        let route = ChainRoute {
            receiver: receiver.clone(),
            gas_limit,
        };
        env.storage()
            .persistent()
            .set(&DataKey::Route(chain_selector), &route);

        EvtChainEnabled {
            chain_selector,
            receiver,
            gas_limit,
        }
        .publish(&env);
        Ok(())
    }

    pub fn disable_chain(
        env: Env,
        caller: Address,
        chain_selector: ChainSelector,
    ) -> Result<(), RegisterError> {
        ensure_admin(&env, &caller)?;
        let key = DataKey::Route(chain_selector);
        let storage = env.storage().persistent();
        if !storage.has(&key) {
            return Err(RegisterError::RouteNotConfigured);
        }
        storage.remove(&key);

        EvtChainDisabled { chain_selector }.publish(&env);
        Ok(())
    }

    pub fn route(env: Env, chain_selector: ChainSelector) -> Option<ChainRoute> {
        read_route(&env, chain_selector)
    }

    pub fn set_fee_mode(env: Env, caller: Address, fee_mode: FeeMode) -> Result<(), RegisterError> {
        ensure_admin(&env, &caller)?;
        let mut config = read_config(&env);
        config.fee_mode = fee_mode;
        write_config(&env, &config);
        Ok(())
    }

    /// Register `name` to `caller` here and on the target chain. Returns the
    /// transport's message id.
    pub fn register(env: Env, caller: Address, name: String) -> Result<BytesN<32>, RegisterError> {
        caller.require_auth();
        if !is_valid_name(&name) {
            return Err(RegisterError::InvalidName);
        }

        let config = read_config(&env);
        let route =
            read_route(&env, config.target_chain).ok_or(RegisterError::RouteNotConfigured)?;

        lookup_api::register(&env, &config.lookup, &name, &caller)?;

        let message = OutboundMessage {
            destination_chain: config.target_chain,
            receiver: route.receiver,
            payload: NameRegistration {
                name: name.clone(),
                owner: caller.clone(),
            }
            .encode(&env),
            fee_mode: config.fee_mode,
            gas_limit: route.gas_limit,
        };

        let quote = transport_api::get_fee(&env, &config.transport, &message);
        authorize_fee(&env, &config.transport, &quote)?;
        let message_id = transport_api::ccip_send(&env, &config.transport, &message);

        log!(&env, "registration sent", name, message_id);
        EvtRegistrationSent {
            name,
            owner: caller,
            destination_chain: config.target_chain,
            message_id: message_id.clone(),
        }
        .publish(&env);

        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccns_types::LookupError;
    use soroban_sdk::{
        testutils::{Address as _, Events, MockAuth, MockAuthInvoke},
        token::StellarAssetClient,
        Map, TryFromVal, Val,
    };
    use std::panic::{catch_unwind, AssertUnwindSafe};

    const TARGET_CHAIN: ChainSelector = 16_015_286_601_757_825_753;
    const GAS_LIMIT: u64 = 200_000;

    #[contract]
    pub struct MockLookup;

    #[derive(Clone)]
    #[contracttype]
    enum MockLookupKey {
        Record(String),
    }

    #[contractimpl]
    impl MockLookup {
        pub fn register(env: Env, name: String, owner: Address) -> Result<(), LookupError> {
            let key = MockLookupKey::Record(name);
            if env.storage().persistent().has(&key) {
                return Err(LookupError::DuplicateName);
            }
            env.storage().persistent().set(&key, &owner);
            Ok(())
        }

        pub fn lookup(env: Env, name: String) -> Result<Address, LookupError> {
            env.storage()
                .persistent()
                .get(&MockLookupKey::Record(name))
                .ok_or(LookupError::NameNotFound)
        }
    }

    #[contract]
    pub struct MockTransport;

    #[derive(Clone)]
    #[contracttype]
    enum MockTransportKey {
        Quote,
        LastSender,
        LastSent,
    }

    #[contractimpl]
    impl MockTransport {
        pub fn set_quote(env: Env, quote: FeeQuote) {
            env.storage().persistent().set(&MockTransportKey::Quote, &quote);
        }

        pub fn get_fee(env: Env, _message: OutboundMessage) -> FeeQuote {
            env.storage()
                .persistent()
                .get(&MockTransportKey::Quote)
                .unwrap_or_else(|| panic!("mock quote not set"))
        }

        pub fn ccip_send(env: Env, sender: Address, message: OutboundMessage) -> BytesN<32> {
            sender.require_auth();
            let quote = Self::get_fee(env.clone(), message.clone());
            if quote.amount > 0 {
                token::TokenClient::new(&env, &quote.token).transfer(
                    &sender,
                    &env.current_contract_address(),
                    &quote.amount,
                );
            }
            let storage = env.storage().persistent();
            storage.set(&MockTransportKey::LastSender, &sender);
            storage.set(&MockTransportKey::LastSent, &message);
            BytesN::from_array(&env, &[7u8; 32])
        }

        pub fn last_sender(env: Env) -> Option<Address> {
            env.storage().persistent().get(&MockTransportKey::LastSender)
        }

        pub fn last_sent(env: Env) -> Option<OutboundMessage> {
            env.storage().persistent().get(&MockTransportKey::LastSent)
        }
    }

    struct Setup<'a> {
        env: Env,
        register: RegisterClient<'a>,
        transport: MockTransportClient<'a>,
        lookup: MockLookupClient<'a>,
        admin: Address,
        fee_token: Address,
    }

    fn setup<'a>() -> Setup<'a> {
        let env = Env::default();
        env.mock_all_auths();

        let register_id = env.register(Register, ());
        let transport_id = env.register(MockTransport, ());
        let lookup_id = env.register(MockLookup, ());
        let admin = Address::generate(&env);
        let fee_token = env
            .register_stellar_asset_contract_v2(admin.clone())
            .address();

        let register = RegisterClient::new(&env, &register_id);
        let transport = MockTransportClient::new(&env, &transport_id);
        let lookup = MockLookupClient::new(&env, &lookup_id);

        register.init(
            &admin,
            &transport_id,
            &lookup_id,
            &TARGET_CHAIN,
            &FeeMode::Native,
        );
        transport.set_quote(&FeeQuote {
            token: fee_token.clone(),
            amount: 0,
        });

        Setup {
            env,
            register,
            transport,
            lookup,
            admin,
            fee_token,
        }
    }

    fn name(env: &Env, text: &str) -> String {
        String::from_str(env, text)
    }

    #[test]
    fn init_once() {
        let s = setup();
        let config = s.register.config();
        assert_eq!(config.target_chain, TARGET_CHAIN);
        assert_eq!(config.fee_mode, FeeMode::Native);
        assert_eq!(
            s.register.try_init(
                &s.admin,
                &config.transport,
                &config.lookup,
                &TARGET_CHAIN,
                &FeeMode::Link
            ),
            Err(Ok(RegisterError::AlreadyInitialized))
        );
    }

    #[test]
    fn enable_chain_stores_route() {
        let s = setup();
        let receiver = Address::generate(&s.env);

        s.register
            .enable_chain(&s.admin, &TARGET_CHAIN, &receiver, &GAS_LIMIT);

        assert_eq!(
            s.register.route(&TARGET_CHAIN),
            Some(ChainRoute {
                receiver,
                gas_limit: GAS_LIMIT
            })
        );
    }

    #[test]
    fn enable_chain_emits_chain_enabled_event() {
        let s = setup();
        let receiver = Address::generate(&s.env);

        s.register
            .enable_chain(&s.admin, &TARGET_CHAIN, &receiver, &GAS_LIMIT);

        let events = s.env.events().all();
        let mut found = false;
        for idx in 0..events.len() {
            let (event_contract, event_topics, event_data) = events.get(idx).unwrap();
            if event_contract != s.register.address {
                continue;
            }

            let topic_symbol =
                Symbol::try_from_val(&s.env, &event_topics.get(0).unwrap()).unwrap();
            if topic_symbol != Symbol::new(&s.env, "chain_enabled") {
                continue;
            }

            let topic_chain = u64::try_from_val(&s.env, &event_topics.get(1).unwrap()).unwrap();
            assert_eq!(topic_chain, TARGET_CHAIN);

            let data_map = Map::<Symbol, Val>::try_from_val(&s.env, &event_data).unwrap();
            let event_receiver = Address::try_from_val(
                &s.env,
                &data_map.get(Symbol::new(&s.env, "receiver")).unwrap(),
            )
            .unwrap();
            let gas_limit = u64::try_from_val(
                &s.env,
                &data_map.get(Symbol::new(&s.env, "gas_limit")).unwrap(),
            )
            .unwrap();
            assert_eq!(event_receiver, receiver);
            assert_eq!(gas_limit, GAS_LIMIT);

            found = true;
        }

        assert!(found, "expected chain_enabled event on enable_chain");
    }

    #[test]
    fn enable_chain_overwrites_existing_route() {
        let s = setup();
        let first = Address::generate(&s.env);
        let second = Address::generate(&s.env);

        s.register
            .enable_chain(&s.admin, &TARGET_CHAIN, &first, &GAS_LIMIT);
        s.register
            .enable_chain(&s.admin, &TARGET_CHAIN, &second, &500_000);

        let route = s.register.route(&TARGET_CHAIN).unwrap();
        assert_eq!(route.receiver, second);
        assert_eq!(route.gas_limit, 500_000);
    }

    #[test]
    fn enable_chain_rejects_zero_gas_limit() {
        let s = setup();
        let receiver = Address::generate(&s.env);
        assert_eq!(
            s.register
                .try_enable_chain(&s.admin, &TARGET_CHAIN, &receiver, &0),
            Err(Ok(RegisterError::InvalidGasLimit))
        );
        assert!(s.register.route(&TARGET_CHAIN).is_none());
    }

    #[test]
    fn non_admin_cannot_enable_chain() {
        let s = setup();
        let stranger = Address::generate(&s.env);
        let receiver = Address::generate(&s.env);

        assert_eq!(
            s.register
                .try_enable_chain(&stranger, &TARGET_CHAIN, &receiver, &GAS_LIMIT),
            Err(Ok(RegisterError::Unauthorized))
        );
        assert!(s.register.route(&TARGET_CHAIN).is_none());
    }

    #[test]
    fn enable_chain_requires_admin_signature() {
        let env = Env::default();
        let register_id = env.register(Register, ());
        let register = RegisterClient::new(&env, &register_id);
        let admin = Address::generate(&env);
        let receiver = Address::generate(&env);
        register.init(
            &admin,
            &Address::generate(&env),
            &Address::generate(&env),
            &TARGET_CHAIN,
            &FeeMode::Native,
        );

        let unsigned = catch_unwind(AssertUnwindSafe(|| {
            register.enable_chain(&admin, &TARGET_CHAIN, &receiver, &GAS_LIMIT)
        }));
        assert!(unsigned.is_err());

        register
            .mock_auths(&[MockAuth {
                address: &admin,
                invoke: &MockAuthInvoke {
                    contract: &register_id,
                    fn_name: "enable_chain",
                    args: (&admin, TARGET_CHAIN, &receiver, GAS_LIMIT).into_val(&env),
                    sub_invokes: &[],
                },
            }])
            .enable_chain(&admin, &TARGET_CHAIN, &receiver, &GAS_LIMIT);
        assert!(register.route(&TARGET_CHAIN).is_some());
    }

    #[test]
    fn disable_chain_removes_route() {
        let s = setup();
        let receiver = Address::generate(&s.env);
        s.register
            .enable_chain(&s.admin, &TARGET_CHAIN, &receiver, &GAS_LIMIT);

        s.register.disable_chain(&s.admin, &TARGET_CHAIN);

        assert!(s.register.route(&TARGET_CHAIN).is_none());
        assert_eq!(
            s.register.try_disable_chain(&s.admin, &TARGET_CHAIN),
            Err(Ok(RegisterError::RouteNotConfigured))
        );
    }

    #[test]
    fn register_without_route_fails() {
        let s = setup();
        let alice = Address::generate(&s.env);
        let alice_name = name(&s.env, "alice.ccns");

        assert_eq!(
            s.register.try_register(&alice, &alice_name),
            Err(Ok(RegisterError::RouteNotConfigured))
        );
        assert!(s.transport.last_sent().is_none());
        assert!(s.lookup.try_lookup(&alice_name).is_err());
    }

    #[test]
    fn route_to_another_chain_does_not_count() {
        let s = setup();
        let receiver = Address::generate(&s.env);
        s.register
            .enable_chain(&s.admin, &(TARGET_CHAIN + 1), &receiver, &GAS_LIMIT);

        let alice = Address::generate(&s.env);
        assert_eq!(
            s.register.try_register(&alice, &name(&s.env, "alice.ccns")),
            Err(Ok(RegisterError::RouteNotConfigured))
        );
    }

    #[test]
    fn register_records_locally_and_dispatches() {
        let s = setup();
        let receiver = Address::generate(&s.env);
        let alice = Address::generate(&s.env);
        let alice_name = name(&s.env, "alice.ccns");
        s.register
            .enable_chain(&s.admin, &TARGET_CHAIN, &receiver, &GAS_LIMIT);

        let message_id = s.register.register(&alice, &alice_name);

        assert_eq!(message_id, BytesN::from_array(&s.env, &[7u8; 32]));
        assert_eq!(s.lookup.lookup(&alice_name), alice);
        assert_eq!(s.transport.last_sender(), Some(s.register.address.clone()));

        let sent = s.transport.last_sent().unwrap();
        assert_eq!(sent.destination_chain, TARGET_CHAIN);
        assert_eq!(sent.receiver, receiver);
        assert_eq!(sent.gas_limit, GAS_LIMIT);
        assert_eq!(sent.fee_mode, FeeMode::Native);
        assert_eq!(
            NameRegistration::decode(&s.env, &sent.payload),
            Some(NameRegistration {
                name: alice_name,
                owner: alice,
            })
        );
    }

    #[test]
    fn register_emits_registration_sent_event() {
        let s = setup();
        let receiver = Address::generate(&s.env);
        s.register
            .enable_chain(&s.admin, &TARGET_CHAIN, &receiver, &GAS_LIMIT);
        let alice = Address::generate(&s.env);
        let alice_name = name(&s.env, "alice.ccns");

        let message_id = s.register.register(&alice, &alice_name);

        let events = s.env.events().all();
        let mut found = false;
        for idx in 0..events.len() {
            let (event_contract, event_topics, event_data) = events.get(idx).unwrap();
            if event_contract != s.register.address {
                continue;
            }

            let topic_symbol =
                Symbol::try_from_val(&s.env, &event_topics.get(0).unwrap()).unwrap();
            if topic_symbol != Symbol::new(&s.env, "registration_sent") {
                continue;
            }

            let topic_name = String::try_from_val(&s.env, &event_topics.get(1).unwrap()).unwrap();
            assert_eq!(topic_name, alice_name);

            let data_map = Map::<Symbol, Val>::try_from_val(&s.env, &event_data).unwrap();
            let owner = Address::try_from_val(
                &s.env,
                &data_map.get(Symbol::new(&s.env, "owner")).unwrap(),
            )
            .unwrap();
            let sent_id = BytesN::<32>::try_from_val(
                &s.env,
                &data_map.get(Symbol::new(&s.env, "message_id")).unwrap(),
            )
            .unwrap();
            assert_eq!(owner, alice);
            assert_eq!(sent_id, message_id);

            found = true;
        }

        assert!(found, "expected registration_sent event on register");
    }

    #[test]
    fn register_requires_caller_signature() {
        let s = setup();
        let receiver = Address::generate(&s.env);
        s.register
            .enable_chain(&s.admin, &TARGET_CHAIN, &receiver, &GAS_LIMIT);

        let alice = Address::generate(&s.env);
        let mallory = Address::generate(&s.env);
        let alice_name = name(&s.env, "alice.ccns");

        let forged = catch_unwind(AssertUnwindSafe(|| {
            s.register
                .mock_auths(&[MockAuth {
                    address: &mallory,
                    invoke: &MockAuthInvoke {
                        contract: &s.register.address,
                        fn_name: "register",
                        args: (&alice, &alice_name).into_val(&s.env),
                        sub_invokes: &[],
                    },
                }])
                .register(&alice, &alice_name)
        }));
        assert!(forged.is_err());
        assert!(s.transport.last_sent().is_none());
    }

    #[test]
    fn duplicate_register_is_rejected_without_dispatch() {
        let s = setup();
        let receiver = Address::generate(&s.env);
        s.register
            .enable_chain(&s.admin, &TARGET_CHAIN, &receiver, &GAS_LIMIT);

        let alice = Address::generate(&s.env);
        let bob = Address::generate(&s.env);
        let taken = name(&s.env, "alice.ccns");
        s.register.register(&alice, &taken);
        let first = s.transport.last_sent();

        assert_eq!(
            s.register.try_register(&bob, &taken),
            Err(Ok(RegisterError::DuplicateName))
        );
        assert_eq!(s.lookup.lookup(&taken), alice);
        assert_eq!(s.transport.last_sent(), first);
    }

    #[test]
    fn empty_name_is_rejected() {
        let s = setup();
        let receiver = Address::generate(&s.env);
        s.register
            .enable_chain(&s.admin, &TARGET_CHAIN, &receiver, &GAS_LIMIT);

        let alice = Address::generate(&s.env);
        assert_eq!(
            s.register.try_register(&alice, &name(&s.env, "")),
            Err(Ok(RegisterError::InvalidName))
        );
    }

    #[test]
    fn register_pays_quoted_fee() {
        let s = setup();
        let receiver = Address::generate(&s.env);
        s.register
            .enable_chain(&s.admin, &TARGET_CHAIN, &receiver, &GAS_LIMIT);
        s.transport.set_quote(&FeeQuote {
            token: s.fee_token.clone(),
            amount: 25,
        });
        StellarAssetClient::new(&s.env, &s.fee_token).mint(&s.register.address, &100);

        let alice = Address::generate(&s.env);
        s.register.register(&alice, &name(&s.env, "alice.ccns"));

        let token = token::TokenClient::new(&s.env, &s.fee_token);
        assert_eq!(token.balance(&s.register.address), 75);
        assert_eq!(token.balance(&s.transport.address), 25);
    }

    #[test]
    fn register_without_fee_balance_leaves_no_trace() {
        let s = setup();
        let receiver = Address::generate(&s.env);
        s.register
            .enable_chain(&s.admin, &TARGET_CHAIN, &receiver, &GAS_LIMIT);
        s.transport.set_quote(&FeeQuote {
            token: s.fee_token.clone(),
            amount: 25,
        });

        let alice = Address::generate(&s.env);
        let alice_name = name(&s.env, "alice.ccns");
        assert_eq!(
            s.register.try_register(&alice, &alice_name),
            Err(Ok(RegisterError::InsufficientFeeBalance))
        );
        assert!(s.lookup.try_lookup(&alice_name).is_err());
        assert!(s.transport.last_sent().is_none());
    }

    #[test]
    fn fee_mode_is_carried_on_the_message() {
        let s = setup();
        let receiver = Address::generate(&s.env);
        s.register
            .enable_chain(&s.admin, &TARGET_CHAIN, &receiver, &GAS_LIMIT);

        s.register.set_fee_mode(&s.admin, &FeeMode::Link);
        assert_eq!(s.register.config().fee_mode, FeeMode::Link);

        let alice = Address::generate(&s.env);
        s.register.register(&alice, &name(&s.env, "alice.ccns"));
        assert_eq!(s.transport.last_sent().unwrap().fee_mode, FeeMode::Link);

        let stranger = Address::generate(&s.env);
        assert_eq!(
            s.register.try_set_fee_mode(&stranger, &FeeMode::Native),
            Err(Ok(RegisterError::Unauthorized))
        );
    }
}
