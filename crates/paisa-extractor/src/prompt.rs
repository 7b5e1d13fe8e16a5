//! Prompt engineering for transaction extraction
//!
//! The prompt is a pure function of the statement text and chunk position.
//! Business rules (merchant derivation, credit/debit sign, the advisory
//! category mapping) are encoded as natural-language instructions; the
//! near-zero sampling temperature is a gateway calling convention, not a
//! concern of this module.

/// System message framing every extraction call
pub const SYSTEM_PROMPT: &str = "You are a financial data extraction expert specializing in \
Indian bank statements. Extract transaction data accurately from Kotak, HDFC, SBI, ICICI and \
other Indian bank statements. Always return valid JSON format without markdown formatting.";

const EXTRACTION_RULES: &str = r#"IMPORTANT RULES:
1. Extract ONLY real transactions from the statement (ignore headers, footers, account details)
2. Look for transaction rows with Date, Narration, Amount, and Balance columns
3. For UPI transactions: extract the merchant name from the narration (e.g., "UPI/LILA PITTURA DECO" -> "LILA PITTURA DECO")
4. For IMPS/NEFT: extract the sender/receiver name
5. Amounts: Use the "Withdrawal(Dr)/Deposit(Cr)" column values
6. Type: "income" for (Cr) credits, "expense" for (Dr) debits
7. Currency: INR (Indian Rupees)
8. Date: Use the exact date from the statement (format: YYYY-MM-DD)
9. Category: Categorize based on merchant/description:
   - UPI/Gaming apps -> "entertainment"
   - UPI/Food merchants -> "food"
   - UPI/Transport -> "transport"
   - IMPS/NEFT transfers -> "other"
   - Salary/credits -> "salary"
   - Shopping -> "shopping"
   - Bills/utilities -> "utilities""#;

const OUTPUT_FORMAT: &str = r#"Return ONLY a valid JSON array. Keep descriptions SHORT (max 50 chars). Format:
[{"description":"UPI/MERCHANT","amount":300,"type":"expense","category":"food","date":"2023-09-06","merchant":"MERCHANT","currency":"INR"}]

CRITICAL: Ensure valid JSON - no line breaks in strings, proper escaping, complete array."#;

/// Builds the user prompt for a statement or one chunk of it
pub struct PromptBuilder<'a> {
    text: &'a str,
    chunk: Option<(usize, usize)>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a prompt builder for the full statement text
    pub fn new(text: &'a str) -> Self {
        Self { text, chunk: None }
    }

    /// Mark this prompt as covering chunk `number` of `total`
    ///
    /// Chunk numbers are one-based; they appear verbatim in the prompt so
    /// the model and the logs agree on progress.
    pub fn for_chunk(mut self, number: usize, total: usize) -> Self {
        self.chunk = Some((number, total));
        self
    }

    /// Render the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        match self.chunk {
            Some((number, total)) => {
                prompt.push_str(&format!(
                    "Extract ALL transactions from this Indian bank statement chunk (Part {}/{}).\n\n",
                    number, total
                ));
            }
            None => {
                prompt.push_str("Extract ALL transactions from this Indian bank statement.\n\n");
            }
        }

        prompt.push_str(EXTRACTION_RULES);
        prompt.push_str("\n\n");

        if self.chunk.is_some() {
            prompt.push_str("Statement chunk:\n");
        } else {
            prompt.push_str("Statement content:\n");
        }
        prompt.push_str(self.text);
        prompt.push_str("\n\n");

        prompt.push_str(OUTPUT_FORMAT);

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_text() {
        let prompt = PromptBuilder::new("06-09-2023 UPI/SHOP Dr 120.00").build();
        assert!(prompt.contains("06-09-2023 UPI/SHOP Dr 120.00"));
        assert!(prompt.contains("Statement content:"));
    }

    #[test]
    fn test_prompt_includes_rules() {
        let prompt = PromptBuilder::new("text").build();
        assert!(prompt.contains("\"income\" for (Cr) credits"));
        assert!(prompt.contains("format: YYYY-MM-DD"));
        assert!(prompt.contains("LILA PITTURA DECO"));
        assert!(prompt.contains("Return ONLY a valid JSON array"));
    }

    #[test]
    fn test_chunk_position_is_rendered() {
        let prompt = PromptBuilder::new("text").for_chunk(2, 5).build();
        assert!(prompt.contains("(Part 2/5)"));
        assert!(prompt.contains("Statement chunk:"));
        assert!(!prompt.contains("Statement content:"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = PromptBuilder::new("same text").for_chunk(1, 2).build();
        let b = PromptBuilder::new("same text").for_chunk(1, 2).build();
        assert_eq!(a, b);
    }
}
