//! Prompt construction for test-file analysis

pub const SYSTEM_PROMPT: &str = "You are a senior QA engineer documenting end-to-end browser tests. \
Read the test file and respond with a single JSON object only, no prose and no code fences. \
Use these keys: testTitle (string), summary (string), tags (array of strings), \
functionalitiesCovered (array of strings), \
testData (object with arrays inputs, mockData, apiEndpoints), \
steps (array of objects with action and verification).";

/// Template first, then the file verbatim.
pub fn build_user_prompt(template: &str, file_name: &str, source: &str) -> String {
    format!(
        "{}\n\n---\n\nTest file: {}\n\n```javascript\n{}\n```\n",
        template.trim_end(),
        file_name,
        source
    )
}
