//! services/campaign_service.rs
//! Arma la cola (CSV + plantillas), valida la cuota y se la entrega al secuenciador.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::{
    error::{MailerError, MailerResult},
    models::message_model::{CampaignPreview, CampaignRequest, MessageRequest},
    services::{
        enhancer_service::{EnhanceContext, TextEnhancer},
        quota_service::QuotaService,
        sequencer_service::Sequencer,
        state_store::{self, StateStore},
        template_service,
    },
};

#[derive(Clone)]
pub struct CampaignService {
    store: Arc<dyn StateStore>,
    quota: QuotaService,
    enhancer: Arc<dyn TextEnhancer>,
    sequencer: Sequencer,
}

impl CampaignService {
    pub fn new(
        store: Arc<dyn StateStore>,
        quota: QuotaService,
        enhancer: Arc<dyn TextEnhancer>,
        sequencer: Sequencer,
    ) -> Self {
        Self {
            store,
            quota,
            enhancer,
            sequencer,
        }
    }

    pub fn build(&self, req: &CampaignRequest) -> MailerResult<VecDeque<MessageRequest>> {
        let recipients = template_service::parse_recipients(&req.recipients_csv)?;
        Ok(template_service::build_queue(
            &req.subject_template,
            &req.body_template,
            &recipients,
        ))
    }

    /// Expande las plantillas sin enviar nada.
    pub fn preview(&self, req: &CampaignRequest) -> MailerResult<CampaignPreview> {
        let messages: Vec<MessageRequest> = self.build(req)?.into_iter().collect();
        Ok(CampaignPreview {
            total: messages.len(),
            messages,
        })
    }

    /// Devuelve cuántos mensajes quedaron encolados.
    pub async fn start(&self, req: &CampaignRequest) -> MailerResult<usize> {
        let mut queue = self.build(req)?;
        if queue.is_empty() {
            return Err(MailerError::EmptyQueue);
        }

        // La cuota sólo se verifica al arrancar (ver DESIGN.md)
        self.quota.check_and_reset().await?;
        self.quota.ensure_can_send().await?;

        let settings = state_store::load_settings(self.store.as_ref()).await?;
        if settings.ai_enabled && !settings.api_key.is_empty() {
            log::info!("Mejorando {} cuerpos con IA", queue.len());
            for msg in queue.iter_mut() {
                let ctx = EnhanceContext {
                    company: msg.company.clone(),
                    role: msg.role.clone(),
                };
                msg.body = self.enhancer.enhance(&msg.body, &ctx, &settings.api_key).await;
            }
        }

        let total = queue.len();
        self.sequencer.start(queue).await?;
        Ok(total)
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }
}
