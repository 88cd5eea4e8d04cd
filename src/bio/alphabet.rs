/// Symbol alphabets for trie indexing
use serde::{Deserialize, Serialize};

const INVALID: u8 = u8::MAX;

/// A finite, case-insensitive symbol set mapped onto dense codes `0..len()`.
///
/// Codes follow the order the symbols were given in, which is also the order
/// trie children are visited in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Alphabet {
    symbols: Vec<u8>,
    codes: Vec<u8>,
}

impl Alphabet {
    pub fn new(symbols: &[u8]) -> crate::Result<Self> {
        if symbols.is_empty() {
            return Err(crate::StarlingError::Config(
                "alphabet must contain at least one symbol".to_string(),
            ));
        }
        if symbols.len() >= INVALID as usize {
            return Err(crate::StarlingError::Config(format!(
                "alphabet of {} symbols is too large",
                symbols.len()
            )));
        }

        let mut codes = vec![INVALID; 256];
        let mut upper = Vec::with_capacity(symbols.len());
        for &symbol in symbols {
            let symbol = symbol.to_ascii_uppercase();
            if !symbol.is_ascii_graphic() {
                return Err(crate::StarlingError::Config(format!(
                    "alphabet symbol {:#04x} is not printable",
                    symbol
                )));
            }
            if codes[symbol as usize] != INVALID {
                return Err(crate::StarlingError::Config(format!(
                    "alphabet symbol '{}' appears twice",
                    symbol as char
                )));
            }
            let code = upper.len() as u8;
            codes[symbol as usize] = code;
            codes[symbol.to_ascii_lowercase() as usize] = code;
            upper.push(symbol);
        }

        Ok(Self {
            symbols: upper,
            codes,
        })
    }

    /// `ACGTN`, the default for DNA barcodes.
    pub fn nucleotide() -> Self {
        let symbols = b"ACGTN".to_vec();
        let mut codes = vec![INVALID; 256];
        for (code, &symbol) in symbols.iter().enumerate() {
            codes[symbol as usize] = code as u8;
            codes[symbol.to_ascii_lowercase() as usize] = code as u8;
        }
        Self { symbols, codes }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    pub fn code(&self, symbol: u8) -> Option<u8> {
        match self.codes[symbol as usize] {
            INVALID => None,
            code => Some(code),
        }
    }

    pub fn symbol(&self, code: u8) -> u8 {
        self.symbols[code as usize]
    }

    /// Encode `sequence` into `out`, replacing its contents.
    pub fn encode_into(&self, sequence: &[u8], out: &mut Vec<u8>) -> crate::Result<()> {
        out.clear();
        out.try_reserve(sequence.len())?;
        for (pos, &symbol) in sequence.iter().enumerate() {
            match self.code(symbol) {
                Some(code) => out.push(code),
                None => {
                    return Err(crate::StarlingError::Config(format!(
                        "symbol '{}' at position {} of {} is not in alphabet {}",
                        symbol.escape_ascii(),
                        pos,
                        String::from_utf8_lossy(sequence),
                        String::from_utf8_lossy(&self.symbols)
                    )))
                }
            }
        }
        Ok(())
    }

    pub fn encode(&self, sequence: &[u8]) -> crate::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_into(sequence, &mut out)?;
        Ok(out)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::nucleotide()
    }
}

impl TryFrom<String> for Alphabet {
    type Error = crate::StarlingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value.as_bytes())
    }
}

impl From<Alphabet> for String {
    fn from(alphabet: Alphabet) -> Self {
        String::from_utf8_lossy(&alphabet.symbols).into_owned()
    }
}
