//! Prompt builder: a fixed system instruction with the retrieved reviews,
//! followed by the user's question.
//!
//! Templates use `{name}` placeholders; `{{` and `}}` render literal braces.
//! Substitution is single-pass, so braces inside substituted values are kept as-is.

use ai_llm_service::ChatMessage;

use crate::error::PromptError;

/// System instructions for answering from patient reviews.
pub const REVIEW_SYSTEM_TEMPLATE: &str = "Your job is to use patient
reviews to answer questions about their experience at
a hospital. Use the following context to answer questions.
Be as detailed as possible, but don't make up any information
that's not from the context. If you don't know an answer, say
you don't know.

{context}
";

/// The human turn is the question verbatim.
pub const REVIEW_HUMAN_TEMPLATE: &str = "{question}";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(String),
}

/// A parsed string template with a fixed set of input variables.
#[derive(Clone, Debug)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
    input_variables: Vec<String>,
}

impl PromptTemplate {
    /// Parses `template` and checks its placeholders against `input_variables`.
    ///
    /// # Errors
    /// - [`PromptError::UnbalancedBrace`] on malformed braces.
    /// - [`PromptError::UnknownVariable`] if a placeholder is not declared.
    /// - [`PromptError::UnexpectedVariable`] if a declared variable is never used.
    ///
    /// # Example
    /// ```
    /// # use review_chain::prompt::PromptTemplate;
    /// let t = PromptTemplate::new("Q: {question}", &["question"]).unwrap();
    /// assert_eq!(t.render(&[("question", "why?")]).unwrap(), "Q: why?");
    /// ```
    pub fn new(template: &str, input_variables: &[&str]) -> Result<Self, PromptError> {
        let segments = parse(template)?;

        for seg in &segments {
            if let Segment::Var(name) = seg {
                if !input_variables.contains(&name.as_str()) {
                    return Err(PromptError::UnknownVariable(name.clone()));
                }
            }
        }
        for declared in input_variables {
            let used = segments
                .iter()
                .any(|s| matches!(s, Segment::Var(n) if n == declared));
            if !used {
                return Err(PromptError::UnexpectedVariable((*declared).to_string()));
            }
        }

        Ok(Self {
            segments,
            input_variables: input_variables.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Renders the template with exactly the declared variables.
    ///
    /// # Errors
    /// - [`PromptError::MissingVariable`] for the first declared variable not supplied.
    /// - [`PromptError::UnexpectedVariable`] for the first supplied variable not declared.
    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String, PromptError> {
        for declared in &self.input_variables {
            if !vars.iter().any(|(k, _)| *k == declared.as_str()) {
                return Err(PromptError::MissingVariable(declared.clone()));
            }
        }
        for (k, _) in vars {
            if !self.input_variables.iter().any(|d| d == *k) {
                return Err(PromptError::UnexpectedVariable((*k).to_string()));
            }
        }

        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => out.push_str(s),
                Segment::Var(name) => {
                    let value = vars
                        .iter()
                        .find(|(k, _)| *k == name.as_str())
                        .map(|(_, v)| *v)
                        .unwrap_or_default();
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn parse(template: &str) -> Result<Vec<Segment>, PromptError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if chars.peek().map(|(_, n)| *n) == Some('{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek().map(|(_, n)| *n) == Some('}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, '{')) | None => return Err(PromptError::UnbalancedBrace(pos)),
                        Some((_, ch)) => name.push(ch),
                    }
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Var(name));
            }
            '}' => return Err(PromptError::UnbalancedBrace(pos)),
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// The two inputs of the review prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewInputs {
    /// Retrieved passages, already joined.
    pub context: String,
    pub question: String,
}

/// Rendered `[system, human]` message pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptMessages([ChatMessage; 2]);

impl PromptMessages {
    pub fn system(&self) -> &ChatMessage {
        &self.0[0]
    }

    pub fn human(&self) -> &ChatMessage {
        &self.0[1]
    }

    pub fn as_slice(&self) -> &[ChatMessage] {
        &self.0
    }
}

/// System template over `context` plus human template over `question`.
#[derive(Clone, Debug)]
pub struct ReviewPrompt {
    system: PromptTemplate,
    human: PromptTemplate,
}

impl ReviewPrompt {
    /// The standard review prompt.
    pub fn reviews() -> Result<Self, PromptError> {
        Self::from_templates(REVIEW_SYSTEM_TEMPLATE, REVIEW_HUMAN_TEMPLATE)
    }

    /// Custom wording; the system template must use exactly `{context}` and
    /// the human template exactly `{question}`.
    pub fn from_templates(system: &str, human: &str) -> Result<Self, PromptError> {
        Ok(Self {
            system: PromptTemplate::new(system, &["context"])?,
            human: PromptTemplate::new(human, &["question"])?,
        })
    }

    pub fn format_messages(&self, inputs: &ReviewInputs) -> Result<PromptMessages, PromptError> {
        let system = self.system.render(&[("context", inputs.context.as_str())])?;
        let human = self.human.render(&[("question", inputs.question.as_str())])?;
        Ok(PromptMessages([
            ChatMessage::system(system),
            ChatMessage::human(human),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::ChatRole;

    fn inputs(context: &str, question: &str) -> ReviewInputs {
        ReviewInputs {
            context: context.into(),
            question: question.into(),
        }
    }

    #[test]
    fn review_prompt_renders_system_then_human() {
        let p = ReviewPrompt::reviews().unwrap();
        let msgs = p
            .format_messages(&inputs("Review A: quiet ward.", "Was it quiet?"))
            .unwrap();

        assert_eq!(msgs.as_slice().len(), 2);
        assert_eq!(msgs.system().role, ChatRole::System);
        assert!(msgs.system().content.starts_with("Your job is to use patient\nreviews"));
        assert!(msgs.system().content.ends_with("you don't know.\n\nReview A: quiet ward.\n"));
        assert_eq!(msgs.human().role, ChatRole::Human);
        assert_eq!(msgs.human().content, "Was it quiet?");
    }

    #[test]
    fn empty_context_still_renders() {
        let p = ReviewPrompt::reviews().unwrap();
        let msgs = p.format_messages(&inputs("", "Anything?")).unwrap();
        assert!(msgs.system().content.ends_with("say\nyou don't know.\n\n\n"));
    }

    #[test]
    fn substituted_values_are_not_reparsed() {
        let p = ReviewPrompt::reviews().unwrap();
        let msgs = p
            .format_messages(&inputs("uses {question} and {{x}}", "{context}"))
            .unwrap();
        assert!(msgs.system().content.ends_with("uses {question} and {{x}}\n"));
        assert_eq!(msgs.human().content, "{context}");
    }

    #[test]
    fn escaped_braces_render_literally() {
        let t = PromptTemplate::new("{{json}} {v} }}", &["v"]).unwrap();
        assert_eq!(t.render(&[("v", "1")]).unwrap(), "{json} 1 }");
    }

    #[test]
    fn construction_rejects_mismatched_placeholders() {
        assert_eq!(
            PromptTemplate::new("{context} {extra}", &["context"]).unwrap_err(),
            PromptError::UnknownVariable("extra".into())
        );
        assert_eq!(
            PromptTemplate::new("no placeholders", &["context"]).unwrap_err(),
            PromptError::UnexpectedVariable("context".into())
        );
        assert!(matches!(
            ReviewPrompt::from_templates("{question}", "{question}"),
            Err(PromptError::UnknownVariable(_))
        ));
    }

    #[test]
    fn construction_rejects_unbalanced_braces() {
        assert_eq!(
            PromptTemplate::new("abc {context", &["context"]).unwrap_err(),
            PromptError::UnbalancedBrace(4)
        );
        assert_eq!(
            PromptTemplate::new("x } y", &[]).unwrap_err(),
            PromptError::UnbalancedBrace(2)
        );
    }

    #[test]
    fn missing_variable_fails_the_same_way_every_time() {
        let t = PromptTemplate::new(REVIEW_SYSTEM_TEMPLATE, &["context"]).unwrap();
        let first = t.render(&[]).unwrap_err();
        let second = t.render(&[]).unwrap_err();
        assert_eq!(first, PromptError::MissingVariable("context".into()));
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn extra_variable_is_rejected_at_render() {
        let t = PromptTemplate::new("{question}", &["question"]).unwrap();
        assert_eq!(
            t.render(&[("question", "q"), ("context", "c")]).unwrap_err(),
            PromptError::UnexpectedVariable("context".into())
        );
    }
}
