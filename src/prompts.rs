//! Prompts for the LLM-backed classifier and flashcard synthesizer.
//!
//! Every prompt lives here so a wording change touches exactly one place and
//! unit tests can inspect prompts without a provider.

/// System prompt for CEFR classification of a word batch.
pub const CLASSIFY_SYSTEM_PROMPT: &str = r#"You are a linguistic expert specializing in the Common European Framework of Reference for Languages (CEFR).

Classify each English word you are given according to its CEFR level: A1, A2, B1, B2, C1 or C2.

Rules:
1. Respond with a single, valid JSON object.
2. Each key is a word exactly as given in the list; each value is its CEFR level as a string.
3. Omit proper nouns, names, slang and non-standard English words.
4. Omit words that are not on the CEFR scale.
5. Output ONLY the JSON object. No commentary, no markdown fences."#;

/// System prompt for flashcard synthesis.
pub const FLASHCARD_SYSTEM_PROMPT: &str = r#"You are an expert linguist creating flashcards for an English language learner.

You receive a JSON array of objects, each with a "word" and the "context" sentence it appeared in.
For EACH object, produce one flashcard object with these fields:

- "word": the target word, exactly as given
- "partOfSpeech": the part of speech in this context (e.g. noun, verb, adjective)
- "ipa": the International Phonetic Alphabet pronunciation, without slashes
- "definition": a concise, simple English definition suitable for a learner
- "exampleSentence": the EXACT context sentence provided for that word
- "synonyms": a list of 2-3 common synonyms

Rules:
1. Respond with a single JSON array containing exactly one flashcard per input object, in the same order.
2. "word", "partOfSpeech", "definition" and "exampleSentence" are required.
3. Output ONLY the JSON array. No commentary, no markdown fences."#;

/// User message listing the words of one classification batch.
pub fn classify_user_prompt(words: &[String]) -> String {
    format!("Words: {}", words.join(", "))
}

/// User message carrying the `{word, context}` payload of one synthesis chunk.
pub fn flashcard_user_prompt(payload_json: &str) -> String {
    format!("Input words and contexts:\n{payload_json}")
}
