//! Prompt templates sent to the text model.

use crate::models::{Genre, StoryPrompt, Tone};

fn genre_guidance(genre: Genre) -> &'static str {
    match genre {
        Genre::Fantasy => {
            "Incorporate magical elements, mythical creatures, or supernatural abilities. Create a sense of wonder and possibility."
        }
        Genre::ScienceFiction => {
            "Include futuristic technology, scientific concepts, or speculative elements. Consider how innovations impact society and individuals."
        }
        Genre::Mystery => {
            "Introduce an intriguing puzzle or problem to solve. Plant subtle clues and create tension through the unknown."
        }
        Genre::Adventure => {
            "Focus on journey, exploration, and facing challenges. Include elements of risk and discovery."
        }
        Genre::Romance => {
            "Center on the development of a relationship. Include emotional connection and meaningful interactions between characters."
        }
        Genre::Horror => {
            "Create an atmosphere of dread, suspense, or fear. Use psychological tension or supernatural elements to unsettle the reader."
        }
    }
}

fn tone_guidance(tone: Tone) -> &'static str {
    match tone {
        Tone::Lighthearted => {
            "Maintain an optimistic, upbeat mood. Include elements of humor and charm. Avoid overly dark or disturbing content."
        }
        Tone::Serious => {
            "Approach the narrative with gravity and earnestness. Explore deeper themes and complex emotional situations."
        }
        Tone::Funny => {
            "Incorporate humor through situations, dialogue, or character traits. Aim for moments that will make the reader smile or laugh."
        }
        Tone::Dramatic => {
            "Emphasize emotional intensity and significant conflicts. Create moments of high stakes and powerful feelings."
        }
        Tone::Mysterious => {
            "Cultivate an atmosphere of the unknown. Hold back information and reveal it gradually to create intrigue."
        }
        Tone::Educational => {
            "Weave informative content into the narrative naturally. Ensure facts are accurate while maintaining engaging storytelling."
        }
        Tone::Inspirational => {
            "Include themes of growth, overcoming obstacles, or finding meaning. Aim to evoke positive emotions and motivation."
        }
    }
}

/// Storyteller instructions tailored to genre and tone.
pub fn storyteller_preamble(genre: Genre, tone: Tone) -> String {
    format!(
        "You are an expert storyteller who writes engaging, well-structured illustrated stories. \
Create a cohesive narrative with a clear beginning, middle, and end, compelling characters, \
vivid sensory detail and scenes that translate well into illustrations.\n\
For this {genre} story: {}\n\
Maintain a {tone} tone: {}\n",
        genre_guidance(genre),
        tone_guidance(tone),
    )
}

pub fn story_sketch(prompt: &StoryPrompt) -> String {
    let mut text = format!(
        "{}\nCreate a rough sketch for a {}-scene {} story with a {} tone based on this idea:\n\"{}\"\n",
        storyteller_preamble(prompt.genre, prompt.tone),
        prompt.num_scenes,
        prompt.genre,
        prompt.tone.to_string().to_lowercase(),
        prompt.idea.trim(),
    );

    if let Some(character) = prompt.character_text() {
        text.push_str(&format!("\nThe main character is described as: {}\n", character));
    }
    if let Some(setting) = prompt.setting_text() {
        text.push_str(&format!("\nThe story is set in: {}\n", setting));
    }

    text.push_str(&format!(
        "\nYour response should include:\n\
1. A brief story synopsis (2-3 sentences)\n\
2. Main plot points for a {}-scene structure\n\
3. Key themes or motifs\n\
4. Critical story elements (items, places, events)\n\n\
Format your response in clear sections with headers. Keep the entire response under 400 words.",
        prompt.num_scenes
    ));
    text
}

pub fn character_profile(sketch: &str, user_character: Option<&str>) -> String {
    let mut text = format!(
        "Based on the following story sketch, create a detailed description of the main character.\n\n\
STORY SKETCH:\n{}\n",
        sketch
    );

    if let Some(character) = user_character {
        text.push_str(&format!(
            "\nADDITIONAL CHARACTER INFORMATION FROM USER:\n{}\n\nIncorporate these details into your character profile.\n",
            character
        ));
    }

    text.push_str(
        "\nCreate a character profile with these sections:\n\
PHYSICAL APPEARANCE: age, distinguishing features, style of dress and other visual traits.\n\
PERSONALITY: key traits, values, fears, desires and quirks.\n\
BACKGROUND: backstory that shapes the character's actions in this story.\n\
RELATIONSHIPS: important connections to other characters or entities.\n\
GROWTH ARC: how the character changes over the story.\n\n\
Be specific and visual where possible.",
    );
    text
}

pub fn story_scenes(sketch: &str, character: &str, num_scenes: u8) -> String {
    let mut text = format!(
        "Create {} detailed, coherent scenes for a story based on the following story sketch and character profile.\n\n\
STORY SKETCH:\n{}\n\nCHARACTER PROFILE:\n{}\n\nFormat your response exactly as follows:\n",
        num_scenes, sketch, character
    );

    for n in 1..=num_scenes {
        text.push_str(&format!(
            "\nSCENE {}: [Vivid, visual description of scene {} that advances the story.]\n",
            n, n
        ));
    }

    text.push_str(
        "\nKeep each scene between 100 and 150 words. Keep the character consistent across scenes \
and let the narrative build logically from one scene to the next.",
    );
    text
}

pub fn scene_image_prompt(
    scene_text: &str,
    scene_index: usize,
    character_appearance: &str,
    prompt: &StoryPrompt,
) -> String {
    let mut text = format!(
        "Create a detailed image prompt for scene {} of an illustrated story.\n\nSCENE TEXT:\n{}\n",
        scene_index + 1,
        scene_text
    );
    if !character_appearance.is_empty() {
        text.push_str(&format!("\nMAIN CHARACTER APPEARANCE:\n{}\n", character_appearance));
    }
    if let Some(setting) = prompt.setting_text() {
        text.push_str(&format!("\nSETTING:\n{}\n", setting));
    }
    text.push_str(
        "\nDescribe what should be visible: environment, lighting, mood and characters. \
Keep it under 100 words and return only the prompt.",
    );
    text
}

pub fn story_title(idea: &str, sketch: &str) -> String {
    let preview: String = sketch.chars().take(200).collect();
    format!(
        "Create a compelling title for this story.\n\nSTORY IDEA:\n{}\n\nSTORY SKETCH:\n{}...\n\n\
The title should be catchy, relevant to the story, between 2 and 7 words and evocative of its mood.\n\
Return only the title itself, without quotes or additional commentary.",
        idea.trim(),
        preview
    )
}

pub fn regenerate_scene(prompt: &StoryPrompt, scene_index: usize, current_text: &str) -> String {
    let mut text = format!(
        "{}\nRewrite Scene {} for a {} story with a {} tone.\n\nORIGINAL STORY IDEA:\n{}\n\nCURRENT SCENE TEXT:\n{}\n",
        storyteller_preamble(prompt.genre, prompt.tone),
        scene_index + 1,
        prompt.genre,
        prompt.tone,
        prompt.idea.trim(),
        current_text
    );

    if let Some(character) = prompt.character_text() {
        text.push_str(&format!("\nMAIN CHARACTER:\n{}\n", character));
    }
    if let Some(setting) = prompt.setting_text() {
        text.push_str(&format!("\nSETTING:\n{}\n", setting));
    }

    text.push_str(
        "\nWrite a completely new version of this scene that keeps its position in the story, \
keeps the same characters and setting, takes the story in a somewhat different direction \
and is vivid enough to be illustrated.\n\
Write only the new scene text, without any introductory text or scene numbers.",
    );
    text
}
