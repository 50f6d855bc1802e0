//! Pattern matcher: turns raw input into a draft reply.
//!
//! The draft is only a seed for the completion service; it is never returned
//! to the caller directly. Matching is a pure function of the input and the
//! rule table: the first rule with a matching trigger wins, and a fallback
//! template covers everything else.

/// Placeholder replaced by the trimmed input when a template is rendered.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// A keyword / phrase rule with a reply template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    name: String,
    triggers: Vec<String>,
    template: String,
    whole_word: bool,
}

impl PatternRule {
    /// A rule whose single-word triggers match any word starting with them.
    ///
    /// Triggers containing spaces match as phrases on word boundaries.
    pub fn new<I, S>(name: impl Into<String>, triggers: I, template: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            triggers: triggers
                .into_iter()
                .map(|t| normalize(t.as_ref()))
                .filter(|t| !t.is_empty())
                .collect(),
            template: template.into(),
            whole_word: false,
        }
    }

    /// Require single-word triggers to equal a whole word ("hi" must not
    /// match "history").
    pub fn whole_word(mut self) -> Self {
        self.whole_word = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    fn matches(&self, normalized: &str) -> bool {
        self.triggers.iter().any(|trigger| {
            if trigger.contains(' ') {
                format!(" {normalized} ").contains(&format!(" {trigger} "))
            } else if self.whole_word {
                normalized.split(' ').any(|word| word == trigger)
            } else {
                normalized.split(' ').any(|word| word.starts_with(trigger.as_str()))
            }
        })
    }
}

/// Lowercase and collapse every run of non-alphanumeric characters into a
/// single space.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn render(template: &str, input: &str) -> String {
    template.replace(INPUT_PLACEHOLDER, input.trim())
}

/// Stateless classifier producing draft replies from a fixed rule table.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    rules: Vec<PatternRule>,
    fallback: String,
}

impl PatternMatcher {
    /// A matcher over a custom rule table.
    pub fn new(rules: Vec<PatternRule>, fallback: impl Into<String>) -> Self {
        Self {
            rules,
            fallback: fallback.into(),
        }
    }

    /// Draft a reply for `input`.
    pub fn generate_response(&self, input: &str) -> String {
        match self.matched_rule(input) {
            Some(rule) => render(&rule.template, input),
            None => render(&self.fallback, input),
        }
    }

    /// The rule that fires for `input`, if any.
    pub fn matched_rule(&self, input: &str) -> Option<&PatternRule> {
        let normalized = normalize(input);
        if normalized.is_empty() {
            return None;
        }
        self.rules.iter().find(|rule| rule.matches(&normalized))
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }
}

impl Default for PatternMatcher {
    /// The built-in rule table.
    fn default() -> Self {
        let rules = vec![
            PatternRule::new(
                "greeting",
                ["hello", "hi", "hey", "greetings", "good morning", "good evening"],
                "Greetings. Quantum channel established. Acknowledge the operator and offer assistance with: {input}",
            )
            .whole_word(),
            PatternRule::new(
                "help",
                ["help", "assist", "guide", "how do i"],
                "Assistance requested. Outline the available capabilities relevant to: {input}",
            ),
            PatternRule::new(
                "entanglement",
                ["entangle", "bell state", "spooky action"],
                "Entanglement query detected. Describe correlated quantum states in the context of: {input}",
            ),
            PatternRule::new(
                "superposition",
                ["superpos", "wave function", "wavefunction"],
                "Superposition query detected. Explain simultaneous state amplitudes for: {input}",
            ),
            PatternRule::new(
                "computing",
                ["qubit", "quantum comput", "quantum gate", "algorithm"],
                "Quantum computation query. Summarize qubits, gates and algorithms relevant to: {input}",
            ),
            PatternRule::new(
                "analysis",
                ["analy", "calculat", "compute", "measure"],
                "Analysis requested. Run a structured evaluation of: {input}",
            ),
            PatternRule::new(
                "prediction",
                ["predict", "forecast", "probabilit", "future"],
                "Probabilistic projection requested. Estimate likely outcomes for: {input}",
            ),
            PatternRule::new(
                "status",
                ["status", "diagnostic", "report", "health"],
                "Status report requested. Summarize current systems state regarding: {input}",
            ),
            PatternRule::new(
                "explanation",
                ["explain", "what is", "how does", "why", "describe"],
                "Explanation requested. Provide a clear breakdown of: {input}",
            ),
        ];

        Self::new(
            rules,
            "Processing quantum query. Formulate a response to: {input}",
        )
    }
}
