use crate::rpc::UNKNOWN_SENTINEL;
use crate::tokenlist::{TokenList, TokenRecord};

/// A record is publishable on a trusted list only when every field is
/// present and decoded. Bridged "(PoS)" names are rejected so stripped
/// names must be supplied through the overwrite file.
pub fn validate_token(token: &TokenRecord) -> bool {
    if token.address.is_empty() {
        return false;
    }
    if token.chain_id == 0 {
        return false;
    }
    if token.name.is_empty() || token.name == UNKNOWN_SENTINEL {
        return false;
    }
    if token.symbol.is_empty() || token.symbol == UNKNOWN_SENTINEL {
        return false;
    }
    if token.decimals == 0 {
        return false;
    }
    if token.logo_uri.is_none() {
        return false;
    }
    if token.name.contains("(PoS)") {
        return false;
    }

    true
}

pub fn validate_token_list(list: &TokenList) -> bool {
    list.tokens.iter().all(validate_token)
}

/// The addresses of every invalid record, for the build failure message.
pub fn invalid_tokens(list: &TokenList) -> Vec<String> {
    list.tokens
        .iter()
        .filter(|token| !validate_token(token))
        .map(|token| token.address.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenlist::first_version;

    fn valid_token() -> TokenRecord {
        TokenRecord {
            address: String::from("0xba100000625a3754423978a60c9317c58a424e3D"),
            chain_id: 1,
            name: String::from("Balancer"),
            symbol: String::from("BAL"),
            decimals: 18,
            logo_uri: Some(String::from("https://example.com/bal.png")),
        }
    }

    fn list_of(tokens: Vec<TokenRecord>) -> TokenList {
        TokenList {
            name: String::from("EVM Tokenlists"),
            timestamp: String::from("2023-01-01T00:00:00.000Z"),
            logo_uri: String::from("https://example.com/logo.png"),
            keywords: vec![String::from("tokenlists"), String::from("listed")],
            version: first_version(),
            tokens,
        }
    }

    #[test]
    fn test_valid_token_passes() {
        assert!(validate_token(&valid_token()));
    }

    #[test]
    fn test_sentinel_fields_are_rejected() {
        let mut token = valid_token();
        token.name = String::from(UNKNOWN_SENTINEL);
        assert!(!validate_token(&token));

        let mut token = valid_token();
        token.symbol = String::from(UNKNOWN_SENTINEL);
        assert!(!validate_token(&token));
    }

    #[test]
    fn test_missing_logo_is_rejected() {
        let mut token = valid_token();
        token.logo_uri = None;
        assert!(!validate_token(&token));
    }

    #[test]
    fn test_bridged_pos_name_is_rejected() {
        let mut token = valid_token();
        token.name = String::from("Dai Stablecoin (PoS)");
        assert!(!validate_token(&token));
    }

    #[test]
    fn test_zero_decimals_is_rejected() {
        let mut token = valid_token();
        token.decimals = 0;
        assert!(!validate_token(&token));
    }

    #[test]
    fn test_invalid_tokens_are_enumerated() {
        let mut broken = valid_token();
        broken.address = String::from("0x9bA00D6856a4eDF4665BcA2C2309936572473B7E");
        broken.name = String::from(UNKNOWN_SENTINEL);

        let list = list_of(vec![valid_token(), broken]);

        assert!(!validate_token_list(&list));
        assert_eq!(
            invalid_tokens(&list),
            vec![String::from("0x9bA00D6856a4eDF4665BcA2C2309936572473B7E")]
        );
    }
}
