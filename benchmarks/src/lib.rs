//! Corpus partagé des benchmarks Brume.
//!
//! Tout est généré en mémoire ; aucun fichier externe n'est lu.

use std::fmt::Write as _;

/// Petites expressions représentatives (nom, source).
pub const MICRO: &[(&str, &str)] = &[
    ("literal", "42"),
    ("arith", "(1 + 2) * 3 - 4 / 5"),
    ("unary", "-(-(-(-1)))"),
    ("compare", "1 < 2 == !(3 >= 4)"),
    ("equality", "nil == false != (true == !nil)"),
    ("comments", "// en-tête\n1 + // milieu\n2 // fin\n"),
];

/// Somme `0 + 1 + … + (terms - 1)` ; au plus 256 termes tiennent dans un chunk.
pub fn sum_chain(terms: usize) -> String {
    let mut src = String::with_capacity(terms * 6);
    for i in 0..terms {
        if i > 0 {
            src.push_str(" + ");
        }
        let _ = write!(src, "{i}.5");
    }
    src
}

/// Expression imbriquée de profondeur `depth` sans constantes (`!(!(… nil))`).
pub fn nested_not(depth: usize) -> String {
    format!("{}nil{}", "!(".repeat(depth), ")".repeat(depth))
}

/// Texte d'environ `bytes` octets pour le scanner : opérateurs, nombres,
/// mots-clés et commentaires sur plusieurs lignes.
pub fn scanner_corpus(bytes: usize) -> String {
    const LINE: &str = "var x = (12.5 + 3) * -4 >= 7 and !nil or \"str\"; // commentaire\n";
    LINE.repeat(bytes / LINE.len() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generators_produce_valid_expressions() {
        let mut chunk = brume_core::Chunk::new();
        brume_compiler::compile(&sum_chain(256), &mut chunk).unwrap();
        let mut chunk = brume_core::Chunk::new();
        brume_compiler::compile(&nested_not(64), &mut chunk).unwrap();
        for (name, src) in MICRO {
            let mut chunk = brume_core::Chunk::new();
            assert!(brume_compiler::compile(src, &mut chunk).is_ok(), "{name}");
        }
        assert!(scanner_corpus(1024).len() >= 1024);
    }
}
