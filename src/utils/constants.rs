use crate::logic::pools::{Venue, VenueKind};
use crate::utils::token::Token;
use alloy_primitives::{Address, address};

pub const POLYGON_CHAIN_ID: u64 = 137;

pub const MULTICALL3: Address = address!("0xcA11bde05977b3631167028862bE2a173976CA11");

pub const WMATIC: Address = address!("0x0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270");
pub const USDC: Address = address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174");
pub const USDT: Address = address!("0xc2132D05D31c914a87C6611C10748AaCbA11cA93");
pub const WETH: Address = address!("0x7ceB23fD6bC0adD59E62ac25578270cFf1b9f619");
pub const DAI: Address = address!("0x8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063");
pub const WBTC: Address = address!("0x1BFD67037B42Cf73acF2047067bd4F2C47D9BfD6");
pub const LINK: Address = address!("0x53E0bca35Ec356BD5ddDFebbD1Fc0fD03Fabad39");
pub const AAVE: Address = address!("0xD6Df932A45C0f255f85145f286eA0b292B21C90B");
pub const CRV: Address = address!("0x172370d5Cd63279eFa6d502Dab29171933a610AF");
pub const BAL: Address = address!("0x9a71012B13CA4d3D0Cdc72A177DF3ef03b0E76A3");
pub const UNI: Address = address!("0xb33EaAd8d922B1083446DC23f610c2567fB5180f");
pub const SUSHI: Address = address!("0x0b3F868E0BE5597D5DB7fEB59E1CADBb0fdDa50a");

pub const STABLE_SYMBOLS: [&str; 3] = ["USDC", "USDT", "DAI"];
pub const DEFAULT_BRIDGE_SYMBOLS: [&str; 5] = ["USDC", "USDT", "DAI", "WETH", "WMATIC"];

#[non_exhaustive]
pub struct PolygonFactoryAddress;

impl PolygonFactoryAddress {
    // Uniswap V2 compatible
    pub const QUICKSWAP_V2: Address = address!("0x5757371414417b8C6CAad45bAeF941aBc7d3Ab32");
    pub const SUSHISWAP_V2: Address = address!("0xc35dadb65012ec5796536bd9864ed8773abc74c4");
    pub const APESWAP_V2: Address = address!("0xcf083be4164828f00cae704ec15a36d711491284");
    pub const DFYN_V2: Address = address!("0xe7fb3e833efe5f9c441105eb65ef8b261266423b");
    pub const COMETH_V2: Address = address!("0x800b052609c355ca8103e06f022aa30647ead60a");
    pub const MESHSWAP_V2: Address = address!("0x9F3044f7F9FC8bC9eD615d54845b4577B833282d");
    pub const POLYDEX_V2: Address = address!("0xeaa98f7b5f7bfbcd1af14d0efaa9d9e68d82f640");
    pub const POLYCAT_V2: Address = address!("0x477ce834ae6b7ab003cce4bc4d8697763ff456fa");
    pub const RETRO_V2: Address = address!("0x0bb494c4574ff7f70f7d97bc0b89a282ba94bc83");
    pub const DYSTOPIA_V2: Address = address!("0x05faf42811eebc5b0f1b90def4a46f6a5e426d2a");
    pub const HONEYSWAP_V2: Address = address!("0x03DAa61d8007443a6584e3d8f85105096543C19c");
    pub const AURASWAP_V2: Address = address!("0x015DE3ec460869eb5ceAe4224Dc7112ac0a39303");
    pub const LIF3_V2: Address = address!("0x3FB1E7D5d9C974141a5B6E5fa4edab0a7Aa15C6A");
    pub const FRAXSWAP_V2: Address = address!("0x54F454D747e037Da288dB568D4121117EAb34e79");
}

#[non_exhaustive]
pub struct PolygonQuoterAddress;

impl PolygonQuoterAddress {
    // Uniswap V3 QuoterV2
    pub const UNISWAP_V3: Address = address!("0x61fFE014bA17989E743c5F6cB21bF9697530B21e");
}

pub const UNISWAP_V3_FEE_TIERS: [u32; 4] = [100, 500, 3000, 10000];

/// The static Polygon token table used for symbol resolution and as the universe fallback.
pub fn polygon_tokens() -> Vec<Token> {
    vec![
        Token::new(WMATIC, "WMATIC", 18),
        Token::new(USDC, "USDC", 6),
        Token::new(USDT, "USDT", 6),
        Token::new(WETH, "WETH", 18),
        Token::new(DAI, "DAI", 18),
        Token::new(WBTC, "WBTC", 8),
        Token::new(LINK, "LINK", 18),
        Token::new(AAVE, "AAVE", 18),
        Token::new(CRV, "CRV", 18),
        Token::new(BAL, "BAL", 18),
        Token::new(UNI, "UNI", 18),
        Token::new(SUSHI, "SUSHI", 18),
    ]
}

/// Majors that every universe must contain.
pub fn pinned_tokens() -> Vec<Token> {
    vec![Token::new(WMATIC, "WMATIC", 18), Token::new(USDC, "USDC", 6), Token::new(USDT, "USDT", 6)]
}

pub fn default_polygon_venues() -> Vec<Venue> {
    let v2 = |key: &str, factory: Address| Venue::new(key, VenueKind::ConstantProduct { factory, fee_bps: 30 });

    vec![
        v2("quickswap_v2", PolygonFactoryAddress::QUICKSWAP_V2),
        v2("sushiswap_v2", PolygonFactoryAddress::SUSHISWAP_V2),
        v2("apeswap_v2", PolygonFactoryAddress::APESWAP_V2),
        v2("dfyn_v2", PolygonFactoryAddress::DFYN_V2),
        v2("cometh_v2", PolygonFactoryAddress::COMETH_V2),
        v2("meshswap_v2", PolygonFactoryAddress::MESHSWAP_V2),
        v2("polydex_v2", PolygonFactoryAddress::POLYDEX_V2),
        v2("polycat_v2", PolygonFactoryAddress::POLYCAT_V2),
        v2("retro_v2", PolygonFactoryAddress::RETRO_V2),
        v2("dystopia_v2", PolygonFactoryAddress::DYSTOPIA_V2),
        v2("honeyswap_v2", PolygonFactoryAddress::HONEYSWAP_V2),
        v2("auraswap_v2", PolygonFactoryAddress::AURASWAP_V2),
        v2("lif3_v2", PolygonFactoryAddress::LIF3_V2),
        v2("fraxswap_v2", PolygonFactoryAddress::FRAXSWAP_V2),
        Venue::new(
            "uniswap_v3",
            VenueKind::ConcentratedTiered { quoter: PolygonQuoterAddress::UNISWAP_V3, fee_tiers: UNISWAP_V3_FEE_TIERS.to_vec() },
        ),
    ]
}
