//! # Response Table
//!
//! Ordered `(keyword, response)` pairs. Lookup lowercases the input and walks
//! the table front to back; the first keyword that appears anywhere in the
//! input wins. No scoring, no longest-match.

use serde::{Deserialize, Serialize};

/// One keyword phrase and the canned response it selects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResponseEntry {
    pub keyword: String,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTable {
    entries: Vec<ResponseEntry>,
}

impl Default for ResponseTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ResponseTable {
    /// Builds a table from entries in priority order. Keywords are lowercased
    /// so they compare against normalized input.
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(keyword, response)| ResponseEntry {
                    keyword: keyword.to_lowercase(),
                    response,
                })
                .collect(),
        }
    }

    /// The stock table shipped with the widget.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_RESPONSES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    pub fn entries(&self) -> &[ResponseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose keyword is a substring of the lowercased input.
    pub fn lookup(&self, user_text: &str) -> Option<&str> {
        let normalized = user_text.to_lowercase();
        self.entries
            .iter()
            .find(|entry| normalized.contains(&entry.keyword))
            .map(|entry| entry.response.as_str())
    }

    /// Lookup with the generic fallback for unmatched input.
    pub fn resolve(&self, user_text: &str) -> String {
        match self.lookup(user_text) {
            Some(response) => response.to_string(),
            None => fallback_response(user_text),
        }
    }
}

/// Generic reply for input no keyword matched. Echoes the input verbatim.
pub fn fallback_response(user_text: &str) -> String {
    format!(
        "That's an interesting question! I'm processing: \"{user_text}\"

I found some relevant information:
- Consider breaking down the topic into smaller parts
- Use specific keywords for better results
- Ask follow-up questions for clarity

**Related Topics:**
- Artificial Intelligence fundamentals
- Data science approaches
- Technology trends

How can I provide more detailed information?"
    )
}

const BUILTIN_RESPONSES: &[(&str, &str)] = &[
    ("hello", "Hello! 👋 How can I assist you today?"),
    ("how are you", "I'm functioning optimally! ⚡ How can I help you?"),
    (
        "quantum computing",
        "Quantum computing uses quantum bits (qubits) that can exist in superposition.

**Key Concepts:**
- **Superposition**: Qubits can be 0, 1, or both simultaneously
- **Entanglement**: Qubits can be connected in ways classical bits cannot
- **Interference**: Amplify correct answers, cancel wrong ones

**Applications:** Drug discovery, optimization, cryptography, ML

```
|0⟩ + |1⟩ = superposition
```

Want to know more about specific applications?",
    ),
    (
        "ai trends",
        "**Latest AI Trends in 2025:**

1. **Large Language Models**: Advanced context windows (100K+ tokens)
2. **Multimodal AI**: Combined text, image, video understanding
3. **Edge AI**: Running models on devices, not just cloud
4. **AI Safety**: Increased focus on alignment and ethics
5. **Autonomous Agents**: Self-directing AI systems
6. **Retrieval Augmented Generation**: External knowledge integration

**Impact**: Revolutionizing healthcare, finance, creative industries",
    ),
    (
        "machine learning",
        "**How Machine Learning Works:**

1. **Data Collection**: Gather training data
2. **Feature Engineering**: Select relevant features
3. **Model Selection**: Choose algorithm
4. **Training**: Learn patterns from data
5. **Validation**: Test on unseen data
6. **Deployment**: Use in production

**Common Algorithms:**
- Linear Regression
- Decision Trees
- Neural Networks
- Support Vector Machines

Would you like details on any algorithm?",
    ),
    (
        "blockchain",
        "**Blockchain Technology Explained:**

**Core Features:**
- **Distributed**: Data across multiple nodes
- **Immutable**: Cannot be changed once recorded
- **Transparent**: All participants see transactions
- **Secure**: Cryptographic hashing

**How It Works:**
1. Transaction occurs
2. Broadcast to network
3. Nodes validate
4. Add to block
5. Link to previous block (chain)

**Applications:**
- Cryptocurrencies (Bitcoin, Ethereum)
- Supply chain tracking
- Smart contracts
- Digital identity",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> ResponseTable {
        ResponseTable::new(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn test_first_match_wins_over_longest() {
        let t = table(&[("hello", "R1"), ("hell", "R2")]);
        assert_eq!(t.lookup("hello there"), Some("R1"));
    }

    #[test]
    fn test_table_order_decides_not_position_in_input() {
        let t = table(&[("hell", "R2"), ("hello", "R1")]);
        assert_eq!(t.lookup("hello there"), Some("R2"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let t = ResponseTable::builtin();
        assert_eq!(
            t.lookup("Explain BLOCKCHAIN technology"),
            t.lookup("blockchain")
        );
        assert!(t.lookup("HeLLo").is_some());
    }

    #[test]
    fn test_keywords_lowercased_on_construction() {
        let t = table(&[("Machine Learning", "ML")]);
        assert_eq!(t.entries()[0].keyword, "machine learning");
        assert_eq!(t.lookup("how does machine learning work?"), Some("ML"));
    }

    #[test]
    fn test_resolve_falls_back_with_verbatim_input() {
        let t = ResponseTable::builtin();
        let body = t.resolve("Tell me about Rust Lifetimes");
        assert!(body.contains("\"Tell me about Rust Lifetimes\""));
        assert!(body.starts_with("That's an interesting question!"));
    }

    #[test]
    fn test_builtin_quick_prompts_all_match() {
        let t = ResponseTable::builtin();
        for prompt in [
            "Explain quantum computing in simple terms",
            "What are the latest AI trends?",
            "How does machine learning work?",
            "Explain blockchain technology",
        ] {
            assert!(t.lookup(prompt).is_some(), "no match for {prompt}");
        }
    }

    #[test]
    fn test_builtin_hello_entry() {
        let t = ResponseTable::builtin();
        assert_eq!(t.len(), 6);
        assert_eq!(t.lookup("hello"), Some("Hello! 👋 How can I assist you today?"));
    }

    #[test]
    fn test_empty_table_always_falls_back() {
        let t = ResponseTable::new(Vec::new());
        assert!(t.is_empty());
        assert_eq!(t.resolve("hello"), fallback_response("hello"));
    }
}
