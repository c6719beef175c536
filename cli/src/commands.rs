//! Console command parsing.
//!
//! One command per line. Token references take a chain (id or name) and
//! either `native`, a contract address or a symbol from the token list.

use portal_config::TokenList;
use portal_engine::UserAction;
use portal_types::{
    Address, AmountError, ChainId, InputSide, NATIVE_TOKEN_ADDRESS, PortalMode, TokenAmount,
    TokenId, TokenInfo,
};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  mode <bridge|swap|onramp>       switch tab
  source <chain> <token>          pick the source token
  dest <chain> <token>            pick the destination token
  flip                            swap source and destination
  amount <value>                  set the amount to send
  want <value>                    set the amount to receive
  max <balance>                   send the whole balance
  slippage <percent|reset>        set or reset slippage
  wallet <chain|none>             connect on a chain or disconnect
  hash <fragment>                 route as if the location hash changed
  dismiss                         clear the current notice
  show                            print the portal again
  help                            this text
  quit                            leave

chains: ethereum, arbitrum, ape, curtis or a numeric id
tokens: native, a 0x address or a symbol such as USDC";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSelector {
    Native,
    Address(Address),
    Symbol(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRef {
    pub chain: ChainId,
    pub selector: TokenSelector,
}

impl TokenRef {
    /// Symbols are looked up case-insensitively among the chain's listed
    /// tokens. Addresses are passed through for the catalog to judge.
    pub fn resolve(&self, list: &TokenList) -> Result<TokenId, CommandError> {
        match &self.selector {
            TokenSelector::Native => Ok(TokenId::new(self.chain, NATIVE_TOKEN_ADDRESS)),
            TokenSelector::Address(address) => Ok(TokenId::new(self.chain, *address)),
            TokenSelector::Symbol(symbol) => list
                .tokens
                .iter()
                .find(|token| {
                    token.chain_id == self.chain && token.symbol.eq_ignore_ascii_case(symbol)
                })
                .map(TokenInfo::id)
                .ok_or_else(|| CommandError::Symbol {
                    symbol: symbol.clone(),
                    chain: self.chain,
                }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Action(UserAction),
    Select { side: InputSide, token: TokenRef },
    Wallet(Option<ChainId>),
    Show,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),
    #[error("`{command}` needs {what}")]
    Missing {
        command: &'static str,
        what: &'static str,
    },
    #[error("unknown mode `{0}`")]
    Mode(String),
    #[error("unknown chain `{0}`")]
    Chain(String),
    #[error("`{0}` is not a number")]
    Number(String),
    #[error("no token `{symbol}` listed on chain {chain}")]
    Symbol { symbol: String, chain: ChainId },
    #[error(transparent)]
    Amount(#[from] AmountError),
}

pub fn parse_chain(raw: &str) -> Result<ChainId, CommandError> {
    match raw.to_ascii_lowercase().as_str() {
        "ethereum" | "eth" | "mainnet" => Ok(ChainId::ETHEREUM),
        "arbitrum" | "arb" => Ok(ChainId::ARBITRUM),
        "ape" | "apechain" => Ok(ChainId::APE),
        "curtis" => Ok(ChainId::APE_CURTIS),
        other => other
            .parse::<u64>()
            .map(ChainId::new)
            .map_err(|_| CommandError::Chain(raw.to_string())),
    }
}

fn parse_selector(raw: &str) -> TokenSelector {
    if raw.eq_ignore_ascii_case("native") {
        return TokenSelector::Native;
    }
    match raw.parse::<Address>() {
        Ok(address) if raw.starts_with("0x") => TokenSelector::Address(address),
        _ => TokenSelector::Symbol(raw.to_string()),
    }
}

fn token_ref(command: &'static str, args: &[&str]) -> Result<TokenRef, CommandError> {
    let [chain, token] = args else {
        return Err(CommandError::Missing {
            command,
            what: "a chain and a token",
        });
    };
    Ok(TokenRef {
        chain: parse_chain(chain)?,
        selector: parse_selector(token),
    })
}

fn one_arg<'a>(
    command: &'static str,
    what: &'static str,
    args: &[&'a str],
) -> Result<&'a str, CommandError> {
    args.first()
        .copied()
        .ok_or(CommandError::Missing { command, what })
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = words.split_first() else {
        return Ok(Command::Empty);
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "mode" | "tab" => {
            let raw = one_arg("mode", "a mode", args)?;
            let mode =
                PortalMode::parse(raw).ok_or_else(|| CommandError::Mode(raw.to_string()))?;
            Command::Action(UserAction::Mode(mode))
        }
        "source" | "from" => Command::Select {
            side: InputSide::Source,
            token: token_ref("source", args)?,
        },
        "dest" | "to" => Command::Select {
            side: InputSide::Destination,
            token: token_ref("dest", args)?,
        },
        "flip" => Command::Action(UserAction::Flip),
        // Amount text goes through unparsed; the portal sanitizes it.
        "amount" => Command::Action(UserAction::SourceAmount(
            args.first().copied().unwrap_or_default().to_string(),
        )),
        "want" => Command::Action(UserAction::DestinationAmount(
            args.first().copied().unwrap_or_default().to_string(),
        )),
        "max" => {
            let raw = one_arg("max", "the wallet balance", args)?;
            Command::Action(UserAction::MaxOut(TokenAmount::parse(raw)?))
        }
        "slippage" => {
            let raw = one_arg("slippage", "a percentage or `reset`", args)?;
            if raw.eq_ignore_ascii_case("reset") {
                Command::Action(UserAction::ResetSlippage)
            } else {
                let percent = raw
                    .trim_end_matches('%')
                    .parse::<f64>()
                    .map_err(|_| CommandError::Number(raw.to_string()))?;
                Command::Action(UserAction::Slippage(percent))
            }
        }
        "wallet" => {
            let raw = one_arg("wallet", "a chain or `none`", args)?;
            if raw.eq_ignore_ascii_case("none") || raw.eq_ignore_ascii_case("off") {
                Command::Wallet(None)
            } else {
                Command::Wallet(Some(parse_chain(raw)?))
            }
        }
        "hash" => Command::Action(UserAction::LocationHash(
            args.first().copied().unwrap_or_default().to_string(),
        )),
        "dismiss" => Command::Action(UserAction::DismissNotice),
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => return Err(CommandError::Unknown(head.to_string())),
    };
    Ok(command)
}
