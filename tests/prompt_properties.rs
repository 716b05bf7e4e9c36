use regex::Regex;
use shotprompt::grammar::{illustration, photography, Grammar};
use shotprompt::vocab::DIRECTIVE_SUFFIX;
use shotprompt::{
    classify_segment, compose, ensure_directive_suffix, extract_parameters, finalize, reassemble,
    structure_template, Composition,
};

const PROMPTS: [&str; 6] = [
    "Cartoon Illustration, happy robot, Medium Shot, Eye Level, inspired by Studio Ghibli, created in Blender, Studio Ghibli Aesthetic, --ar 16:9 --style raw",
    "Anime, a fox in the snow, Low Angle",
    "paper cutout diorama --ar 4:3",
    "Extreme Close-Up shot of a face, , Watercolor Illustration --style raw --ar 16:9 --style raw",
    "Cinematic, Historical Photography, Marie Antoinette, Full Shot, High Angle, inspired by Vittorio Storaro, 50mm Standard Prime, Kodak Vision3 250D, Baroque Painting Aesthetic --ar 16:9 --style raw",
    "street portrait at dusk, 85mm lens, Neon Noir Aesthetic",
];

fn grammars() -> [&'static Grammar; 2] {
    [illustration(), photography()]
}

#[test]
fn directive_suffix_is_idempotent() {
    let spliced = ["---ar-ar", "---style-ar", "--ar --ar 16:9 --style raw"];
    for prompt in PROMPTS.into_iter().chain(spliced) {
        let once = ensure_directive_suffix(prompt);
        assert_eq!(ensure_directive_suffix(&once), once, "prompt: {prompt}");
        assert!(once.ends_with(DIRECTIVE_SUFFIX));
        assert_eq!(once.matches("--ar").count(), 1, "prompt: {prompt}");
        assert_eq!(once.matches("--style").count(), 1, "prompt: {prompt}");
    }
}

/// Every string of up to five tokens drawn from directive fragments and separators.
fn directive_fragments() -> Vec<String> {
    const TOKENS: [&str; 9] = ["-", "--", "ar", "style", " ", ",", "raw", "16:9", "a"];
    let mut all = vec![String::new()];
    let mut frontier = vec![String::new()];
    for _ in 0..5 {
        frontier = frontier
            .iter()
            .flat_map(|prefix| TOKENS.iter().map(move |token| format!("{prefix}{token}")))
            .collect();
        all.extend(frontier.iter().cloned());
    }
    all
}

#[test]
fn directive_suffix_survives_spliced_fragments() {
    let directive = Regex::new(r"--(?:ar|style)\b").expect("directive regex should compile");
    for text in directive_fragments() {
        let once = ensure_directive_suffix(&text);
        assert_eq!(ensure_directive_suffix(&once), once, "text: {text:?}");
        if once.is_empty() {
            continue;
        }
        assert!(once.ends_with(DIRECTIVE_SUFFIX), "text: {text:?}");
        assert_eq!(directive.find_iter(&once).count(), 2, "text: {text:?} -> {once:?}");

        for grammar in grammars() {
            let finalized = finalize(grammar, &text);
            assert_eq!(finalize(grammar, &finalized), finalized, "text: {text:?}");
            assert_eq!(directive.find_iter(&finalized).count(), 2, "text: {text:?}");
        }
    }
}

#[test]
fn finalize_is_idempotent_for_every_grammar() {
    for grammar in grammars() {
        for prompt in PROMPTS {
            let once = finalize(grammar, prompt);
            assert_eq!(finalize(grammar, &once), once, "prompt: {prompt}");
        }
    }
    for prompt in PROMPTS {
        assert!(finalize(photography(), prompt).starts_with("Cinematic, "));
    }
}

#[test]
fn extraction_is_deterministic_and_complete() {
    for grammar in grammars() {
        let names = grammar
            .categories()
            .iter()
            .map(|category| category.name())
            .collect::<Vec<_>>();
        for prompt in PROMPTS {
            let first = extract_parameters(grammar, prompt);
            assert_eq!(first, extract_parameters(grammar, prompt));
            let categories = first
                .iter()
                .map(|record| record.category.as_str())
                .collect::<Vec<_>>();
            assert_eq!(categories, names, "prompt: {prompt}");
        }
    }
}

#[test]
fn every_record_value_is_an_option_a_clause_or_a_placeholder() {
    for grammar in grammars() {
        for prompt in PROMPTS {
            for record in extract_parameters(grammar, prompt) {
                let placeholder = format!("[{}]", record.category);
                assert!(
                    record.current_value == placeholder
                        || record.allowed_options.contains(&record.current_value)
                        || prompt.contains(&record.current_value),
                    "unexpected value {:?} for {} in {prompt}",
                    record.current_value,
                    record.category
                );
            }
        }
    }
}

#[test]
fn replacing_a_value_with_itself_only_finalizes() {
    for grammar in grammars() {
        for prompt in PROMPTS {
            for record in extract_parameters(grammar, prompt) {
                let result = reassemble(grammar, prompt, &record.current_value, &record.current_value);
                assert_eq!(result.prompt, finalize(grammar, prompt));
            }
        }
    }
}

#[test]
fn edit_and_revert_restores_parameters() {
    let prompt = PROMPTS[0];
    let grammar = illustration();
    let original = extract_parameters(grammar, prompt);
    for (old, new) in [
        ("Medium Shot", "Wide Shot"),
        ("Eye Level", "Low Angle"),
        ("created in Blender", "created in Maya"),
        ("Cartoon Illustration", "Anime"),
    ] {
        let forward = reassemble(grammar, prompt, old, new);
        assert!(forward.prompt.contains(new), "edit {old} -> {new}");
        let back = reassemble(grammar, &forward.prompt, new, old);
        assert_eq!(back.prompt, prompt, "edit {old} -> {new}");
        assert_eq!(back.parameters, original);
    }
}

#[test]
fn shot_type_prefers_most_specific_value() {
    let result = classify_segment(illustration(), "Extreme Close-Up shot of a face");
    assert_eq!(result.category.as_deref(), Some("Shot Type"));
    assert_eq!(result.canonical_value, "Extreme Close-Up");
}

#[test]
fn classification_never_fails_on_odd_input() {
    for clause in ["", "   ", "[", "]]", "[Unknown Slot]", "--ar 16:9", "é", "🦊 fox"] {
        for grammar in grammars() {
            let result = classify_segment(grammar, clause);
            assert_eq!(result.canonical_value, clause.trim());
        }
    }
}

#[test]
fn empty_prompt_differs_from_prompt_missing_fields() {
    for grammar in grammars() {
        assert!(extract_parameters(grammar, "").is_empty());
        let records = extract_parameters(grammar, "a lighthouse at night");
        assert_eq!(records.len(), grammar.categories().len());
    }
    let records = extract_parameters(photography(), "a lighthouse at night");
    assert!(records.iter().all(|record| record.is_placeholder()));
}

#[test]
fn composed_skeleton_round_trips_through_extraction() {
    for grammar in grammars() {
        let skeleton = structure_template(grammar);
        let records = extract_parameters(grammar, &skeleton);
        assert!(records
            .iter()
            .all(|record| record.current_value == format!("[{}]", record.category)));
        assert!(records.iter().all(|record| !record.is_placeholder()));

        let empty = compose(grammar, &Composition::default()).expect("empty compose");
        assert_eq!(finalize(grammar, &empty), empty);
    }
}
