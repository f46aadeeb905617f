//! Prompt templates, matched exhaustively per intent
//!
//! Adding an intent forces a compile error here until a template exists.

use crate::intent::Intent;

/// Fixed answer when retrieval comes back empty. The chat contract returns
/// this exact string with an empty source list.
pub const NO_INFORMATION_ANSWER: &str =
    "No he encontrado esa información en los documentos disponibles.";

/// Fixed answer when the generative service has no usable configuration.
pub const CONFIGURATION_ERROR_ANSWER: &str =
    "El servicio de consultas no está configurado correctamente. \
     Contacta con el administrador para activar el asistente.";

/// Shared grounding rules prepended to every intent template.
pub const BASE_INSTRUCTIONS: &str = "\
Eres un asistente experto en convenios colectivos de handling aeroportuario \
en España. Responde SOLO con la información contenida en el contexto \
proporcionado. Cita siempre el artículo o anexo del que procede cada dato \
(por ejemplo: \"según el Artículo 45\" o \"Anexo II, tabla salarial\"). \
Si el contexto no contiene la respuesta, di exactamente: \
\"No he encontrado esa información en los documentos disponibles.\" \
No inventes cifras, plazos ni referencias legales.";

/// Intent-specific instruction block.
pub fn intent_instructions(intent: Intent) -> &'static str {
    match intent {
        Intent::Salary => {
            "La pregunta es sobre retribución. Usa exclusivamente las tablas \
             salariales del contexto. Indica siempre el año de la tabla, el \
             grupo profesional y el nivel. Si hay varias tablas de años \
             distintos, usa la más reciente y dilo. No hagas cálculos \
             aritméticos: reproduce los importes tal y como figuran."
        }
        Intent::Leave => {
            "La pregunta es sobre permisos, licencias o excedencias. Indica \
             los días que corresponden, si son naturales o laborables, y el \
             grado de parentesco cuando aplique. Si el contexto incluye la \
             tabla de grados de parentesco, úsala para resolver la relación \
             familiar mencionada."
        }
        Intent::Dismissal => {
            "La pregunta es sobre despido, sanción o fin de contrato. Cita \
             el régimen aplicable y los plazos exactos del contexto. \
             Distingue entre despido objetivo, disciplinario e improcedente \
             solo si el contexto lo hace. No des asesoramiento legal más \
             allá del texto del convenio."
        }
        Intent::General => {
            "Responde de forma breve y directa usando el contexto. Si la \
             pregunta mezcla varios temas, trata cada uno por separado."
        }
    }
}

/// Strict approval rubric for the audit pass. The auditor model must answer
/// with a single JSON object.
pub const AUDIT_RUBRIC: &str = "\
Eres un auditor de calidad de respuestas sobre convenios colectivos. \
Evalúa si la RESPUESTA está completamente respaldada por el CONTEXTO: \
(1) cada cifra aparece en el contexto, (2) cada cita de artículo o anexo \
existe en el contexto, (3) no se añade información externa. \
Responde únicamente con este JSON: \
{\"approved\": true|false, \"reason\": \"<una frase>\", \
\"risk_level\": \"low\"|\"medium\"|\"high\"}";
