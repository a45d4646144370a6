//! The review chain: retrieve → prompt → chat → answer.

use tracing::{debug, info, instrument};

use crate::api_types::{Passage, QaAnswer};
use crate::error::ReviewChainError;
use crate::llm::ChatModel;
use crate::prompt::{ReviewInputs, ReviewPrompt};
use crate::retriever::Retriever;

/// Separator between passages in the context section.
pub const PASSAGE_SEPARATOR: &str = "\n\n";

/// Straight-line question answering over reviews.
///
/// Holds no per-request state, so one chain can be shared between tasks.
pub struct ReviewChain<R, C> {
    prompt: ReviewPrompt,
    retriever: R,
    chat: C,
}

impl<R: Retriever, C: ChatModel> ReviewChain<R, C> {
    /// Chain with the standard review prompt.
    pub fn new(retriever: R, chat: C) -> Result<Self, ReviewChainError> {
        Ok(Self::with_prompt(ReviewPrompt::reviews()?, retriever, chat))
    }

    pub fn with_prompt(prompt: ReviewPrompt, retriever: R, chat: C) -> Self {
        Self {
            prompt,
            retriever,
            chat,
        }
    }

    /// Answer a question as plain text.
    ///
    /// # Errors
    /// Retrieval, prompt and chat failures are returned as-is; nothing is retried.
    pub async fn invoke(&self, question: &str) -> Result<String, ReviewChainError> {
        Ok(self.invoke_with_context(question).await?.answer)
    }

    /// Answer a question and return the passages that were shown to the model.
    #[instrument(skip_all, fields(question_len = question.len()))]
    pub async fn invoke_with_context(&self, question: &str) -> Result<QaAnswer, ReviewChainError> {
        let passages = self.retriever.retrieve(question).await?;

        let inputs = ReviewInputs {
            context: join_passages(&passages),
            question: question.to_string(),
        };
        let messages = self.prompt.format_messages(&inputs)?;
        debug!(
            passages = passages.len(),
            system_chars = messages.system().content.len(),
            "prompt rendered"
        );

        let answer = self.chat.complete(messages.as_slice()).await?;
        info!(
            passages = passages.len(),
            answer_len = answer.len(),
            "review question answered"
        );

        Ok(QaAnswer {
            answer,
            context: passages,
        })
    }
}

/// Joins passage texts in retrieval order, separated by a blank line.
pub fn join_passages(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PromptError;
    use crate::llm::ChatFuture;
    use crate::retriever::PassagesFuture;
    use ai_llm_service::{ChatMessage, ChatRole};
    use std::sync::Mutex;

    struct FixedRetriever(Vec<&'static str>);

    impl Retriever for FixedRetriever {
        fn retrieve<'a>(&'a self, _question: &'a str) -> PassagesFuture<'a> {
            let out: Vec<Passage> = self.0.iter().map(|t| Passage::from(*t)).collect();
            Box::pin(async move { Ok(out) })
        }
    }

    /// Deterministic model: answers with the system message's context, records every call.
    #[derive(Default)]
    struct EchoChat {
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl EchoChat {
        fn last_call(&self) -> Vec<ChatMessage> {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl ChatModel for EchoChat {
        fn complete<'a>(&'a self, messages: &'a [ChatMessage]) -> ChatFuture<'a> {
            self.calls.lock().unwrap().push(messages.to_vec());
            let context = messages
                .iter()
                .find(|m| m.role == ChatRole::System)
                .and_then(|m| m.content.split_once("you don't know.\n\n"))
                .map(|(_, ctx)| ctx.to_string())
                .unwrap_or_default();
            Box::pin(async move { Ok(format!("From the reviews: {context}")) })
        }
    }

    const QUESTION: &str = "Did any patients complain about staff rudeness?";
    const REVIEW_A: &str = "Review A: staff was rude.";
    const REVIEW_B: &str = "Review B: staff was excellent.";

    #[tokio::test]
    async fn echo_answer_contains_each_review_once() {
        let chain =
            ReviewChain::new(FixedRetriever(vec![REVIEW_A, REVIEW_B]), EchoChat::default()).unwrap();

        let answer = chain.invoke(QUESTION).await.unwrap();

        assert_eq!(answer.matches(REVIEW_A).count(), 1);
        assert_eq!(answer.matches(REVIEW_B).count(), 1);
    }

    #[tokio::test]
    async fn messages_are_system_then_verbatim_question() {
        let chain =
            ReviewChain::new(FixedRetriever(vec![REVIEW_A, REVIEW_B]), EchoChat::default()).unwrap();
        chain.invoke(QUESTION).await.unwrap();

        let sent = chain.chat.last_call();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, ChatRole::System);
        assert!(sent[0].content.ends_with(&format!("{REVIEW_A}\n\n{REVIEW_B}\n")));
        for review in [REVIEW_A, REVIEW_B] {
            assert_eq!(sent[0].content.matches(review).count(), 1);
        }
        assert_eq!(sent[1], ChatMessage::human(QUESTION));
    }

    #[tokio::test]
    async fn no_passages_still_asks_the_model() {
        let chain = ReviewChain::new(FixedRetriever(vec![]), EchoChat::default()).unwrap();

        let qa = chain.invoke_with_context(QUESTION).await.unwrap();

        assert!(qa.context.is_empty());
        assert_eq!(qa.answer, "From the reviews: \n");
        let sent = chain.chat.last_call();
        assert!(sent[0].content.ends_with("you don't know.\n\n\n"));
    }

    #[tokio::test]
    async fn identical_inputs_give_identical_answers() {
        let chain =
            ReviewChain::new(FixedRetriever(vec![REVIEW_B, REVIEW_A]), EchoChat::default()).unwrap();

        let first = chain.invoke(QUESTION).await.unwrap();
        let second = chain.invoke(QUESTION).await.unwrap();

        assert_eq!(first, second);
        let calls = chain.chat.calls.lock().unwrap();
        assert_eq!(calls[0], calls[1]);
    }

    #[tokio::test]
    async fn answer_carries_the_passages_used() {
        let chain =
            ReviewChain::new(FixedRetriever(vec![REVIEW_A, REVIEW_B]), EchoChat::default()).unwrap();

        let qa = chain.invoke_with_context(QUESTION).await.unwrap();

        let texts: Vec<_> = qa.context.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, [REVIEW_A, REVIEW_B]);
    }

    #[tokio::test]
    async fn retrieval_failure_reaches_the_caller() {
        struct Broken;
        impl Retriever for Broken {
            fn retrieve<'a>(&'a self, _q: &'a str) -> PassagesFuture<'a> {
                Box::pin(async {
                    Err(ReviewChainError::Rag(rag_store::RagError::Qdrant(
                        "collection not found".into(),
                    )))
                })
            }
        }

        let chain = ReviewChain::new(Broken, EchoChat::default()).unwrap();
        let err = chain.invoke(QUESTION).await.unwrap_err();

        assert!(matches!(err, ReviewChainError::Rag(_)));
        assert!(chain.chat.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn custom_prompt_must_keep_both_variables() {
        let err = ReviewPrompt::from_templates("Answer briefly.", "{question}").unwrap_err();
        assert_eq!(err, PromptError::UnexpectedVariable("context".into()));
    }

    #[test]
    fn passages_join_with_blank_line() {
        let ps = [Passage::from("a"), Passage::from("b")];
        assert_eq!(join_passages(&ps), "a\n\nb");
        assert_eq!(join_passages(&[]), "");
    }
}
