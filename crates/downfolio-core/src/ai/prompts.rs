//! Prompt text sent to the model.
//!
//! Both prompts are fixed per document type. The user prompt embeds the job
//! description and the template verbatim.

use downfolio_store::DocumentType;

const RESUME_SYSTEM: &str = "\
You are an expert resume writer specializing in ATS (Applicant Tracking System) optimization and keyword matching.
Your task is to customize resume templates to match specific job descriptions while maintaining authenticity and accuracy.

Guidelines:
- Match keywords from the job description naturally throughout the resume
- Optimize for ATS systems by using standard section headers and formatting
- Highlight relevant skills and experiences that align with the job requirements
- Maintain truthful representation of the candidate's background
- Use action verbs and quantifiable achievements where possible
- Keep the same structure and sections as the template
- Return ONLY the customized markdown content, no explanations or meta-commentary
- Do NOT wrap the response in code blocks (no triple backticks)
- Return raw markdown text only";

const COVER_LETTER_SYSTEM: &str = "\
You are an expert cover letter writer specializing in personalized, compelling cover letters that connect candidate experiences to specific job opportunities.

Guidelines:
- Address the specific company and role mentioned in the job description
- Connect the candidate's background to the job requirements naturally
- Show genuine interest and research about the company/role
- Use a professional but personable tone
- Highlight 2-3 key experiences or skills that directly relate to the job
- Keep the same structure and style as the template
- Return ONLY the customized markdown content, no explanations or meta-commentary
- Do NOT wrap the response in code blocks (no triple backticks)
- Return raw markdown text only";

const RESUME_INSTRUCTIONS: &str = "\
Instructions:
1. Analyze the job description for key requirements, skills, and keywords
2. Customize the resume template to emphasize relevant experiences and skills
3. Match keywords naturally throughout the resume
4. Optimize for ATS systems
5. Maintain the markdown format and structure
6. Return the complete customized resume in markdown format";

const COVER_LETTER_INSTRUCTIONS: &str = "\
Instructions:
1. Extract the company name and role from the job description
2. Customize the cover letter to address this specific opportunity
3. Connect the candidate's background to the job requirements
4. Show genuine interest and understanding of the role
5. Maintain the markdown format and structure
6. Return the complete customized cover letter in markdown format";

/// System prompt for `doc_type`.
pub fn system_prompt(doc_type: DocumentType) -> &'static str {
    match doc_type {
        DocumentType::Resume => RESUME_SYSTEM,
        DocumentType::CoverLetter => COVER_LETTER_SYSTEM,
    }
}

/// User prompt wrapping `job_description` and `template`.
pub fn user_prompt(template: &str, job_description: &str, doc_type: DocumentType) -> String {
    let (noun, heading, instructions) = match doc_type {
        DocumentType::Resume => ("resume", "Resume Template", RESUME_INSTRUCTIONS),
        DocumentType::CoverLetter => (
            "cover letter",
            "Cover Letter Template",
            COVER_LETTER_INSTRUCTIONS,
        ),
    };

    format!(
        "Please customize the following {noun} template to match the job description provided.\n\
         \n\
         Job Description:\n\
         {job_description}\n\
         \n\
         {heading}:\n\
         {template}\n\
         \n\
         {instructions}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompts_forbid_code_fences() {
        for doc_type in DocumentType::ALL {
            let prompt = system_prompt(doc_type);
            assert!(prompt.contains("Do NOT wrap the response in code blocks"));
            assert!(prompt.ends_with("Return raw markdown text only"));
        }
        assert!(system_prompt(DocumentType::Resume).contains("ATS"));
        assert!(system_prompt(DocumentType::CoverLetter).contains("personalized"));
    }

    #[test]
    fn user_prompt_embeds_inputs_verbatim() {
        let prompt = user_prompt("# Jane\n- Rust", "Acme wants Rust", DocumentType::Resume);

        assert!(prompt.starts_with("Please customize the following resume template"));
        assert!(prompt.contains("Job Description:\nAcme wants Rust\n\nResume Template:\n# Jane\n- Rust\n\nInstructions:"));
        assert!(prompt.ends_with("Return the complete customized resume in markdown format"));
    }

    #[test]
    fn cover_letter_prompt_uses_its_own_scaffold() {
        let prompt = user_prompt("Dear team", "Acme", DocumentType::CoverLetter);
        assert!(prompt.contains("Cover Letter Template:\nDear team"));
        assert!(prompt.contains("Extract the company name and role"));
    }
}
