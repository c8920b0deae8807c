//! Deployment fixture for end-to-end tests of the cross-chain name service.
//!
//! Everything lives in one `Env`: the "source chain" is the register contract
//! with its lookup, the "destination chain" is the receiver with its own
//! lookup, and the simulator carries messages between them.

use ccns_types::{ChainSelector, FeeMode};
use lookup::{Lookup, LookupClient};
use receiver::{Receiver, ReceiverClient};
use register::{Register, RegisterClient};
use simulator::{Simulator, SimulatorClient, SimulatorConfig};
use soroban_sdk::{
    testutils::Address as _,
    token::{StellarAssetClient, TokenClient},
    Address, Env, String,
};

/// Chain selector the simulator answers to.
pub const CHAIN_SELECTOR: ChainSelector = 16_015_286_601_757_825_753;

/// Gas limit used when enabling the destination chain.
pub const GAS_LIMIT: u64 = 200_000;

pub struct Deployment<'a> {
    pub env: Env,
    pub admin: Address,
    pub config: SimulatorConfig,
    pub simulator: SimulatorClient<'a>,
    pub register: RegisterClient<'a>,
    pub receiver: ReceiverClient<'a>,
    pub source_lookup: LookupClient<'a>,
    pub destination_lookup: LookupClient<'a>,
}

impl<'a> Deployment<'a> {
    /// Deploy and initialize every contract, without wiring them together.
    pub fn deploy(env: &Env) -> Self {
        let admin = Address::generate(env);
        let native_token = env
            .register_stellar_asset_contract_v2(admin.clone())
            .address();
        let link_token = env
            .register_stellar_asset_contract_v2(admin.clone())
            .address();

        let simulator = SimulatorClient::new(env, &env.register(Simulator, ()));
        simulator.init(&admin, &CHAIN_SELECTOR, &native_token, &link_token);
        let config = simulator.configuration();

        let source_lookup = LookupClient::new(env, &env.register(Lookup, ()));
        source_lookup.init(&admin);
        let destination_lookup = LookupClient::new(env, &env.register(Lookup, ()));
        destination_lookup.init(&admin);

        let register = RegisterClient::new(env, &env.register(Register, ()));
        register.init(
            &admin,
            &config.router,
            &source_lookup.address,
            &config.chain_selector,
            &FeeMode::Native,
        );

        let receiver = ReceiverClient::new(env, &env.register(Receiver, ()));
        receiver.init(&admin, &config.router, &destination_lookup.address);

        Self {
            env: env.clone(),
            admin,
            config,
            simulator,
            register,
            receiver,
            source_lookup,
            destination_lookup,
        }
    }

    /// Deploy, then connect both sides: route to the receiver, trust the
    /// register contract, and hand each lookup to its writer.
    pub fn deploy_wired(env: &Env) -> Self {
        let deployment = Self::deploy(env);
        deployment.enable_chain();
        deployment.trust_register();
        deployment
            .source_lookup
            .set_authority(&deployment.admin, &deployment.register.address);
        deployment
            .destination_lookup
            .set_authority(&deployment.admin, &deployment.receiver.address);
        deployment
    }

    pub fn enable_chain(&self) {
        self.register.enable_chain(
            &self.admin,
            &self.config.chain_selector,
            &self.receiver.address,
            &GAS_LIMIT,
        );
    }

    pub fn trust_register(&self) {
        self.receiver.enable_source(
            &self.admin,
            &self.config.chain_selector,
            &self.register.address,
        );
    }

    pub fn fee_token(&self, fee_mode: FeeMode) -> TokenClient<'a> {
        let token = match fee_mode {
            FeeMode::Native => &self.config.native_token,
            FeeMode::Link => &self.config.link_token,
        };
        TokenClient::new(&self.env, token)
    }

    /// Mint `amount` of the fee token for `fee_mode` to the register contract.
    pub fn fund_register(&self, fee_mode: FeeMode, amount: i128) {
        let token = self.fee_token(fee_mode);
        StellarAssetClient::new(&self.env, &token.address).mint(&self.register.address, &amount);
    }

    pub fn name(&self, text: &str) -> String {
        String::from_str(&self.env, text)
    }
}
