use std::error::Error;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;
use serde_json::json;
use uuid::Uuid;
use content_domain::{Actor, ContentKind, PrivilegeClass, Role};
use workflow::engine::WorkflowEngineConfig;
use workflow::service::ContentService;
use workflow::stubs::InMemoryContentRepository;

/// Pequeño menú interactivo para ejercitar el motor de workflow editorial
/// sobre el repositorio en memoria.
///
/// Opciones soportadas:
/// 1) Ver ítems (tabla con id, tipo y estado)
/// 2) Crear borrador
/// 3) Enviar a revisión / aprobar / rechazar / publicar
/// 4) Ver historial de revisiones
/// 5) Preview de una revisión
/// 6) Salir
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    let repo = Arc::new(InMemoryContentRepository::new());
    let service = ContentService::new(repo, WorkflowEngineConfig { allow_direct_publish: false,
                                                                   ..WorkflowEngineConfig::default() });

    // Actor único con rol elegido por sesión; suficiente para la demo.
    let role_s = prompt("Rol del actor (viewer/editor/reviewer/publisher/admin, enter = admin): ")?;
    let role = Role::from_str(role_s.trim()).unwrap_or(Role::Admin);
    let actor = Actor { id: Uuid::new_v4(), role };
    println!("Actor {} con rol {}", actor.id, actor.role);

    loop {
        println!("\n== Content workflow menu ==");
        println!("1) Ver ítems");
        println!("2) Crear borrador");
        println!("3) Enviar a revisión");
        println!("4) Aprobar revisión");
        println!("5) Rechazar revisión");
        println!("6) Publicar revisión");
        println!("7) Rollback a una revisión publicada");
        println!("8) Ver historial de un ítem");
        println!("9) Generar y resolver preview");
        println!("10) Ver vista pública de un ítem");
        println!("11) Salir");
        print!("Elige una opción: ");
        io::stdout().flush().ok();

        let mut choice = String::new();
        io::stdin().read_line(&mut choice)?;
        match choice.trim() {
            "1" => {
                match service.list_items(None) {
                    Ok(items) => {
                        println!("\nID                                   | TIPO      | ESTADO     | REVISIÓN ACTUAL");
                        println!("--------------------------------------------------------------------------------");
                        for i in items {
                            let rev = i.current_revision_id.map(|u| u.to_string()).unwrap_or_else(|| "-".into());
                            println!("{} | {:9} | {:10} | {}", i.id, i.kind.to_string(), i.status.to_string(), rev);
                        }
                    }
                    Err(e) => eprintln!("Error listando ítems: {}", e),
                }
            }
            "2" => {
                let kind_s = prompt("Tipo (course/blog_post/package/lesson/media/section): ")?;
                let kind = match ContentKind::from_str(kind_s.trim()) {
                    Ok(k) => k,
                    Err(e) => { eprintln!("{}", e); continue; }
                };
                let title = prompt("Título: ")?;
                let payload = json!({ "title": title.trim() });
                match service.create_draft(kind, &actor, payload, None).await {
                    Ok((item, rev)) => println!("Ítem creado: {} con revisión {}", item.id, rev.id),
                    Err(e) => eprintln!("Error creando borrador: {}", e),
                }
            }
            "3" => {
                let (item_id, rev_id) = match prompt_pair()? { Some(p) => p, None => continue };
                match service.submit_for_review(item_id, rev_id, &actor).await {
                    Ok(rev) => println!("Revisión {} en estado {}", rev.id, rev.status),
                    Err(e) => eprintln!("Error enviando a revisión: {}", e),
                }
            }
            "4" => {
                let (item_id, rev_id) = match prompt_pair()? { Some(p) => p, None => continue };
                match service.approve(item_id, rev_id, &actor).await {
                    Ok(rev) => println!("Revisión {} en estado {}", rev.id, rev.status),
                    Err(e) => eprintln!("Error aprobando: {}", e),
                }
            }
            "5" => {
                let (item_id, rev_id) = match prompt_pair()? { Some(p) => p, None => continue };
                let notes = prompt("Notas de revisión (obligatorias): ")?;
                match service.reject(item_id, rev_id, &actor, notes.trim()).await {
                    Ok(rev) => println!("Revisión {} rechazada: {:?}", rev.id, rev.review_notes),
                    Err(e) => eprintln!("Error rechazando: {}", e),
                }
            }
            "6" => {
                let (item_id, rev_id) = match prompt_pair()? { Some(p) => p, None => continue };
                match service.publish(item_id, rev_id, &actor).await {
                    Ok(item) => println!("Ítem {} publicado ({:?})", item.id, item.published_at),
                    Err(e) => eprintln!("Error publicando: {}", e),
                }
            }
            "7" => {
                let (item_id, rev_id) = match prompt_pair()? { Some(p) => p, None => continue };
                match service.rollback(item_id, rev_id, &actor).await {
                    Ok(rev) => println!("Rollback aplicado: nueva revisión {} publicada", rev.id),
                    Err(e) => eprintln!("Error en rollback: {}", e),
                }
            }
            "8" => {
                let id_s = prompt("Ítem id (UUID): ")?;
                let id = match Uuid::parse_str(id_s.trim()) {
                    Ok(u) => u,
                    Err(_) => { eprintln!("UUID inválido"); continue; }
                };
                match service.history(&id) {
                    Ok(revs) => {
                        for r in revs {
                            println!("{} | {:10} | autor {} | {}", r.id, r.status.to_string(), r.author_id, r.created_at);
                        }
                    }
                    Err(e) => eprintln!("Error listando historial: {}", e),
                }
            }
            "9" => {
                let rev_s = prompt("Revisión id (UUID): ")?;
                let rev_id = match Uuid::parse_str(rev_s.trim()) {
                    Ok(u) => u,
                    Err(_) => { eprintln!("UUID inválido"); continue; }
                };
                match service.generate_preview(rev_id, &actor) {
                    Ok(token) => {
                        println!("Token emitido (expira {}): {}", token.expires_at, token.token);
                        match service.resolve_preview(&token.token) {
                            Ok(diff) => println!("Diff pendiente: {}", serde_json::to_string_pretty(&diff)?),
                            Err(e) => eprintln!("Error resolviendo preview: {}", e),
                        }
                    }
                    Err(e) => eprintln!("Error generando preview: {}", e),
                }
            }
            "10" => {
                let id_s = prompt("Ítem id (UUID): ")?;
                let id = match Uuid::parse_str(id_s.trim()) {
                    Ok(u) => u,
                    Err(_) => { eprintln!("UUID inválido"); continue; }
                };
                let kind_s = prompt("Tipo (course/blog_post/package/lesson/media/section): ")?;
                let kind = match ContentKind::from_str(kind_s.trim()) {
                    Ok(k) => k,
                    Err(e) => { eprintln!("{}", e); continue; }
                };
                match service.get_view(kind, id, PrivilegeClass::Anonymous, &json!({})) {
                    Ok(view) => println!("{}", serde_json::to_string_pretty(&view)?),
                    Err(e) => eprintln!("Error obteniendo vista: {}", e),
                }
            }
            "11" => {
                println!("Saliendo...");
                break;
            }
            other => {
                println!("Opción inválida: {}", other);
            }
        }
    }

    Ok(())
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}

fn prompt_pair() -> io::Result<Option<(Uuid, Uuid)>> {
    let item_s = prompt("Ítem id (UUID): ")?;
    let item_id = match Uuid::parse_str(item_s.trim()) {
        Ok(u) => u,
        Err(_) => { eprintln!("UUID inválido"); return Ok(None); }
    };
    let rev_s = prompt("Revisión id (UUID): ")?;
    let rev_id = match Uuid::parse_str(rev_s.trim()) {
        Ok(u) => u,
        Err(_) => { eprintln!("UUID inválido"); return Ok(None); }
    };
    Ok(Some((item_id, rev_id)))
}
