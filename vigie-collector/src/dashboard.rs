/**
 * DASHBOARD HTML - Rendu de l'état des services
 *
 * Fonction pure : consomme les lignes déjà évaluées (site → adresse/joignabilité,
 * service → en retard ou non) et produit le document HTML. Aucune logique
 * d'évaluation ici, le rendu ne fait qu'afficher.
 */
use std::fmt::Write;

#[derive(Debug, Clone)]
pub struct SiteLine {
    pub site: String,
    pub address: Option<String>,
    pub reachable: Option<bool>, // None = pas de sonde configurée
}

#[derive(Debug, Clone)]
pub struct RecordLine {
    pub identity: String, // "site/host/process"
    pub overdue: bool,
}

// les identités viennent des services rapporteurs, donc non fiables
fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

const PAGE_HEAD: &str = r#"<!doctype html>
<html lang="fr">
<head>
  <meta charset="utf-8"/>
  <meta name="viewport" content="width=device-width, initial-scale=1"/>
  <title>Vigie</title>
  <style>
    body { font-family: sans-serif; background: #10141c; color: #e5ecff; margin: 24px; }
    h1 { font-size: 1.4rem; }
    table { border-collapse: collapse; margin-top: 12px; }
    td, th { padding: 4px 12px; border-bottom: 1px solid #263551; text-align: left; }
    .ok { color: #41d38a; }
    .late { color: #ff5d5d; }
    .muted { color: #9eb0d6; }
  </style>
</head>
<body>
  <h1>Vigie — état des services</h1>
"#;

pub fn render(sites: &[SiteLine], records: &[RecordLine]) -> String {
    let mut html = String::from(PAGE_HEAD);

    for s in sites {
        let _ = match (&s.address, s.reachable) {
            (Some(addr), Some(true)) => writeln!(
                html,
                "  <p>site <b>{}</b> — {} <span class=\"ok\">joignable</span></p>",
                escape(&s.site),
                escape(addr)
            ),
            (Some(addr), Some(false)) => writeln!(
                html,
                "  <p>site <b>{}</b> — {} <span class=\"late\">injoignable</span></p>",
                escape(&s.site),
                escape(addr)
            ),
            (Some(addr), None) => writeln!(
                html,
                "  <p>site <b>{}</b> — {} <span class=\"muted\">non sondé</span></p>",
                escape(&s.site),
                escape(addr)
            ),
            (None, _) => writeln!(
                html,
                "  <p>site <b>{}</b> — <span class=\"muted\">aucune adresse courante</span></p>",
                escape(&s.site)
            ),
        };
    }

    html.push_str("  <table>\n    <tr><th>service</th><th>état</th></tr>\n");
    for r in records {
        let (class, label) = if r.overdue {
            ("late", "en retard")
        } else {
            ("ok", "à jour")
        };
        let _ = writeln!(
            html,
            "    <tr><td>{}</td><td class=\"{class}\">{label}</td></tr>",
            escape(&r.identity)
        );
    }
    html.push_str("  </table>\n</body>\n</html>\n");
    html
}

/// Page de repli quand le store est illisible : on l'affiche, on ne devine pas.
pub fn render_unavailable() -> String {
    format!("{PAGE_HEAD}  <p class=\"late\">état indisponible (store illisible)</p>\n</body>\n</html>\n")
}
