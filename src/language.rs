use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::approach::Approach;

/// Shortest string that may take part in a substring match. Keeps single
/// letters like `c` from swallowing labels such as `cs` or `c++`.
const MIN_SUBSTRING_LEN: usize = 2;

/// Fixed alias table, consulted after exact and substring matching.
const ALIASES: &[(&str, &str)] = &[
    ("js", "JavaScript"),
    ("node", "JavaScript"),
    ("nodejs", "JavaScript"),
    ("ts", "TypeScript"),
    ("py", "Python"),
    ("python3", "Python"),
    ("cpp", "C++"),
    ("c++", "C++"),
    ("cxx", "C++"),
    ("cs", "C#"),
    ("csharp", "C#"),
    ("golang", "Go"),
    ("rs", "Rust"),
    ("kt", "Kotlin"),
    ("rb", "Ruby"),
];

fn default_version() -> String {
    "*".to_string()
}

/// Static catalog entry for one language.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LanguageProfile {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub default_code: String,
    /// Language identifier understood by the sandbox service
    pub runtime: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl LanguageProfile {
    fn builtin(name: &str, runtime: &str, file_name: &str, default_code: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            default_code: default_code.to_string(),
            runtime: runtime.to_string(),
            version: default_version(),
            file_name: Some(file_name.to_string()),
        }
    }
}

/// Starter code an admin attached to a question.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StarterSnippet {
    pub language: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
}

/// The set of languages an editor may use, with one designated default.
#[derive(Debug, Clone)]
pub struct LanguageCatalog {
    profiles: Vec<LanguageProfile>,
    default: usize,
}

impl LanguageCatalog {
    /// Builds a catalog. Without `default_name` the first profile is the default.
    pub fn new(profiles: Vec<LanguageProfile>, default_name: Option<&str>) -> Result<Self> {
        if profiles.is_empty() {
            bail!("language catalog must contain at least one language");
        }

        for (i, profile) in profiles.iter().enumerate() {
            if profile.name.trim().is_empty() {
                bail!("language #{i} has an empty name");
            }
            if profiles[..i]
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&profile.name))
            {
                bail!("language {} is declared twice", profile.name);
            }
        }

        let default = match default_name {
            Some(name) => match profiles.iter().position(|p| p.name.eq_ignore_ascii_case(name)) {
                Some(idx) => idx,
                None => bail!("default language {name} is not in the catalog"),
            },
            None => 0,
        };

        Ok(Self { profiles, default })
    }

    /// Catalog used when the configuration does not list languages.
    pub fn builtin() -> Self {
        let profiles = vec![
            LanguageProfile::builtin(
                "Java",
                "java",
                "Main.java",
                "import java.util.*;\n\npublic class Main {\n    public static void main(String[] args) {\n        // Write your code here\n    }\n}\n",
            ),
            LanguageProfile::builtin(
                "Python",
                "python",
                "main.py",
                "def main():\n    # Write your code here\n    pass\n\n\nif __name__ == \"__main__\":\n    main()\n",
            ),
            LanguageProfile::builtin(
                "JavaScript",
                "javascript",
                "main.js",
                "function main() {\n    // Write your code here\n}\n\nmain();\n",
            ),
            LanguageProfile::builtin(
                "TypeScript",
                "typescript",
                "main.ts",
                "function main(): void {\n    // Write your code here\n}\n\nmain();\n",
            ),
            LanguageProfile::builtin(
                "C++",
                "c++",
                "main.cpp",
                "#include <bits/stdc++.h>\nusing namespace std;\n\nint main() {\n    // Write your code here\n    return 0;\n}\n",
            ),
            LanguageProfile::builtin(
                "C",
                "c",
                "main.c",
                "#include <stdio.h>\n\nint main(void) {\n    // Write your code here\n    return 0;\n}\n",
            ),
            LanguageProfile::builtin(
                "C#",
                "csharp",
                "Main.cs",
                "using System;\n\npublic class Program {\n    public static void Main(string[] args) {\n        // Write your code here\n    }\n}\n",
            ),
            LanguageProfile::builtin(
                "Go",
                "go",
                "main.go",
                "package main\n\nimport \"fmt\"\n\nfunc main() {\n\t// Write your code here\n\tfmt.Println()\n}\n",
            ),
            LanguageProfile::builtin(
                "Rust",
                "rust",
                "main.rs",
                "fn main() {\n    // Write your code here\n}\n",
            ),
            LanguageProfile::builtin(
                "Kotlin",
                "kotlin",
                "Main.kt",
                "fun main() {\n    // Write your code here\n}\n",
            ),
            LanguageProfile::builtin(
                "Ruby",
                "ruby",
                "main.rb",
                "# Write your code here\n",
            ),
        ];

        Self {
            profiles,
            default: 0,
        }
    }

    pub fn profiles(&self) -> &[LanguageProfile] {
        &self.profiles
    }

    pub fn default_language(&self) -> &LanguageProfile {
        &self.profiles[self.default]
    }

    /// Looks a language up by its canonical name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&LanguageProfile> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Maps a free-text label onto a catalog entry.
    ///
    /// Rules, first success wins: exact name, substring containment in either
    /// direction (longest name preferred), the profile's own aliases, then the
    /// fixed alias table. Returns `None` when nothing matches; callers fall back
    /// to [`LanguageCatalog::default_language`].
    pub fn canonicalize(&self, label: &str) -> Option<&LanguageProfile> {
        let needle = label.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        if let Some(profile) = self
            .profiles
            .iter()
            .find(|p| p.name.to_lowercase() == needle)
        {
            return Some(profile);
        }

        // Reversed so that equal-length ties resolve to the earlier entry
        if let Some(profile) = self
            .profiles
            .iter()
            .rev()
            .filter(|p| overlaps(&p.name.to_lowercase(), &needle))
            .max_by_key(|p| p.name.len())
        {
            return Some(profile);
        }

        if let Some(profile) = self.profiles.iter().find(|p| {
            p.aliases
                .iter()
                .any(|alias| alias.trim().to_lowercase() == needle)
        }) {
            return Some(profile);
        }

        ALIASES
            .iter()
            .find(|(alias, _)| *alias == needle)
            .and_then(|(_, canonical)| self.get(canonical))
    }

    /// Like [`LanguageCatalog::canonicalize`], but never fails.
    pub fn canonicalize_or_default(&self, label: &str) -> &LanguageProfile {
        self.canonicalize(label)
            .unwrap_or_else(|| self.default_language())
    }
}

fn overlaps(name: &str, needle: &str) -> bool {
    let (short, long) = if name.len() <= needle.len() {
        (name, needle)
    } else {
        (needle, name)
    };
    short.chars().count() >= MIN_SUBSTRING_LEN && long.contains(short)
}

/// Which rule produced a [`Resolution`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "approach_id", rename_all = "snake_case")]
pub enum ResolutionSource {
    /// The latest approach written in the resolved language
    Approach(u32),
    /// The latest approach overall, whose language is not in the catalog
    LatestApproach(u32),
    StarterSnippet,
    /// Code restored from an editor session's local cache
    Cache,
    Default,
}

/// The language and code an editor starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub language: LanguageProfile,
    pub code: String,
    pub source: ResolutionSource,
}

fn most_recent_first(prior: &[Approach]) -> Vec<&Approach> {
    let mut sorted: Vec<&Approach> = prior.iter().collect();
    // Stable, so equal timestamps keep their input order
    sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    sorted
}

/// Picks the initial language and code for an editor on first load.
pub fn resolve_initial(
    prior: &[Approach],
    snippets: &[StarterSnippet],
    catalog: &LanguageCatalog,
) -> Resolution {
    let sorted = most_recent_first(prior);

    if let Some((approach, language)) = sorted
        .iter()
        .find_map(|a| catalog.canonicalize(&a.code_language).map(|l| (*a, l)))
    {
        log::debug!(
            "Resolved {} from approach {}",
            language.name,
            approach.id
        );
        return Resolution {
            language: language.clone(),
            code: approach.code_content.clone(),
            source: ResolutionSource::Approach(approach.id),
        };
    }

    if let Some(latest) = sorted.first() {
        log::debug!(
            "Approach {} has unknown language {:?}, keeping its code under the default language",
            latest.id,
            latest.code_language
        );
        return Resolution {
            language: catalog.default_language().clone(),
            code: latest.code_content.clone(),
            source: ResolutionSource::LatestApproach(latest.id),
        };
    }

    if let Some((snippet, language)) = snippets
        .iter()
        .find_map(|s| catalog.canonicalize(&s.language).map(|l| (s, l)))
    {
        return Resolution {
            language: language.clone(),
            code: snippet.code.clone(),
            source: ResolutionSource::StarterSnippet,
        };
    }

    let language = catalog.default_language();
    Resolution {
        language: language.clone(),
        code: language.default_code.clone(),
        source: ResolutionSource::Default,
    }
}

/// Picks the code to show after the user switches to `selected`.
///
/// Same chain as [`resolve_initial`] with the language fixed, except that an
/// approach written in another language is never offered.
pub fn resolve_for_language(
    selected: &LanguageProfile,
    prior: &[Approach],
    snippets: &[StarterSnippet],
    catalog: &LanguageCatalog,
) -> Resolution {
    let is_selected = |label: &str| {
        catalog
            .canonicalize(label)
            .is_some_and(|l| l.name == selected.name)
    };

    if let Some(approach) = most_recent_first(prior)
        .into_iter()
        .find(|a| is_selected(&a.code_language))
    {
        return Resolution {
            language: selected.clone(),
            code: approach.code_content.clone(),
            source: ResolutionSource::Approach(approach.id),
        };
    }

    if let Some(snippet) = snippets.iter().find(|s| is_selected(&s.language)) {
        return Resolution {
            language: selected.clone(),
            code: snippet.code.clone(),
            source: ResolutionSource::StarterSnippet,
        };
    }

    Resolution {
        language: selected.clone(),
        code: selected.default_code.clone(),
        source: ResolutionSource::Default,
    }
}
