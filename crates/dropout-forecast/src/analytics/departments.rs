use std::collections::HashMap;
use std::sync::OnceLock;

static DEPARTMENT_NAMES: OnceLock<HashMap<i64, &'static str>> = OnceLock::new();

/// Display name for a DANE department code.
pub fn department_name(code: i64) -> String {
    match department_names().get(&code) {
        Some(name) => (*name).to_string(),
        None => format!("Department {code}"),
    }
}

fn department_names() -> &'static HashMap<i64, &'static str> {
    DEPARTMENT_NAMES.get_or_init(|| {
        const CODE_TO_NAME: &[(i64, &str)] = &[
            (5, "Antioquia"),
            (8, "Atlántico"),
            (11, "Bogotá D.C."),
            (13, "Bolívar"),
            (15, "Boyacá"),
            (17, "Caldas"),
            (18, "Caquetá"),
            (19, "Cauca"),
            (20, "Cesar"),
            (23, "Córdoba"),
            (25, "Cundinamarca"),
            (27, "Chocó"),
            (41, "Huila"),
            (44, "La Guajira"),
            (47, "Magdalena"),
            (50, "Meta"),
            (52, "Nariño"),
            (54, "Norte de Santander"),
            (63, "Quindío"),
            (66, "Risaralda"),
            (68, "Santander"),
            (70, "Sucre"),
            (73, "Tolima"),
            (76, "Valle del Cauca"),
            (81, "Arauca"),
            (85, "Casanare"),
            (86, "Putumayo"),
            (88, "San Andrés y Providencia"),
            (91, "Amazonas"),
            (94, "Guainía"),
            (95, "Guaviare"),
            (97, "Vaupés"),
            (99, "Vichada"),
        ];

        CODE_TO_NAME.iter().copied().collect()
    })
}
