//! Static knowledge base of causes and recommended actions per funnel stage.

use crate::stages::StageId;
use growth_core::types::Status;
use serde::Serialize;

/// Entries returned for a stage in `attention`.
pub const ATTENTION_LIMIT: usize = 3;
/// Entries returned for a stage in `critical`.
pub const CRITICAL_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEntry {
    pub stage: StageId,
    /// What the consultant is looking at.
    pub situation: &'static str,
    /// Metric or signal that usually explains it.
    pub cause: &'static str,
    pub action: &'static str,
}

const fn entry(
    stage: StageId,
    situation: &'static str,
    cause: &'static str,
    action: &'static str,
) -> DiagnosticEntry {
    DiagnosticEntry {
        stage,
        situation,
        cause,
        action,
    }
}

use StageId::*;

/// Catalog in priority order. Entries of a stage are always returned in the
/// order they appear here.
pub static CATALOG: &[DiagnosticEntry] = &[
    // Impressão → Clique
    entry(ImpressionToClick, "CTR abaixo do benchmark", "Criativo sem gancho nos primeiros segundos", "Testar 3 novas variações de criativo com gancho direto na dor do público"),
    entry(ImpressionToClick, "Anúncio pouco relevante para o público", "Índice de relevância / qualidade baixo", "Revisar segmentação e excluir públicos amplos demais"),
    entry(ImpressionToClick, "Saturação do criativo", "Frequência acima de 3 na semana", "Rotacionar criativos e limitar frequência por usuário"),
    entry(ImpressionToClick, "Chamada para ação fraca", "CTA genérico no texto do anúncio", "Reescrever CTA com benefício concreto e prazo"),
    entry(ImpressionToClick, "Posicionamentos de baixa qualidade", "CTR por posicionamento muito desigual", "Desativar posicionamentos com CTR abaixo da metade da média"),
    // Clique → Lead
    entry(ClickToLead, "Visitantes não convertem em lead", "Taxa de conversão da landing page", "Reduzir o formulário aos campos essenciais"),
    entry(ClickToLead, "Promessa do anúncio diferente da página", "Taxa de rejeição alta na landing page", "Alinhar título da página com a mensagem do anúncio"),
    entry(ClickToLead, "Página lenta no celular", "Tempo de carregamento acima de 3s", "Otimizar imagens e scripts da landing page"),
    entry(ClickToLead, "Oferta pouco atrativa", "Conversão baixa mesmo com tráfego qualificado", "Testar isca digital ou diagnóstico gratuito"),
    entry(ClickToLead, "Falta de prova social", "Tempo na página alto sem conversão", "Adicionar depoimentos e logos de clientes acima da dobra"),
    // Lead → MQL
    entry(LeadToMql, "Muitos leads fora do perfil", "Percentual de leads desqualificados", "Adicionar pergunta de qualificação no formulário"),
    entry(LeadToMql, "Segmentação de mídia ampla demais", "CPL baixo com qualidade baixa", "Restringir público por cargo, setor ou faturamento"),
    entry(LeadToMql, "Critério de MQL desalinhado", "Divergência entre marketing e vendas", "Revisar o ICP e o critério de MQL com o time comercial"),
    entry(LeadToMql, "Leads sem nutrição", "Leads parados sem interação após captura", "Criar fluxo de nutrição com 4 a 6 e-mails"),
    entry(LeadToMql, "Canal com tráfego de baixa intenção", "Taxa de MQL muito diferente entre canais", "Realocar verba para os canais com maior taxa de MQL"),
    entry(LeadToMql, "Lead scoring inexistente", "Todos os leads tratados igualmente", "Implementar pontuação por perfil e engajamento"),
    // MQL → SQL
    entry(MqlToSql, "MQLs não avançam para oportunidade", "Tempo de primeiro contato", "Garantir contato em até 5 minutos após a conversão"),
    entry(MqlToSql, "Cadência de contato curta", "Número de tentativas por lead", "Adotar cadência de 6 a 8 toques em 14 dias"),
    entry(MqlToSql, "Roteiro de qualificação fraco", "Motivos de descarte genéricos no CRM", "Padronizar roteiro de qualificação (BANT ou SPIN)"),
    entry(MqlToSql, "SDR sobrecarregado", "Leads por SDR acima da capacidade", "Redistribuir leads ou priorizar por pontuação"),
    entry(MqlToSql, "Handoff sem contexto", "Informações do lead ausentes no CRM", "Enviar histórico de navegação e conversões junto do MQL"),
    // SQL → Reunião
    entry(SqlToMeeting, "Oportunidades não agendam reunião", "Taxa de agendamento por SDR", "Oferecer horários na própria ligação com link de agenda"),
    entry(SqlToMeeting, "Alto índice de no-show", "Reuniões marcadas e não realizadas", "Enviar confirmação e lembrete 24h e 1h antes"),
    entry(SqlToMeeting, "Proposta de valor pouco clara", "Objeções recorrentes na qualificação", "Criar pitch de 30 segundos por segmento"),
    entry(SqlToMeeting, "Prazo longo entre qualificação e reunião", "Dias entre SQL e reunião", "Agendar reunião em no máximo 3 dias úteis"),
    entry(SqlToMeeting, "Decisor ausente", "Reuniões com contatos sem poder de decisão", "Mapear o decisor ainda na qualificação"),
    // Reunião → Contrato
    entry(MeetingToContract, "Reuniões não viram contrato", "Taxa de fechamento por vendedor", "Revisar gravações das reuniões perdidas com o time"),
    entry(MeetingToContract, "Proposta enviada tarde", "Tempo entre reunião e proposta", "Enviar proposta em até 24h após a reunião"),
    entry(MeetingToContract, "Objeção de preço frequente", "Motivo de perda registrado como preço", "Reforçar ROI na proposta e criar opção de entrada"),
    entry(MeetingToContract, "Follow-up inconsistente", "Propostas sem próximo passo definido", "Definir data de retorno ao final de cada reunião"),
    entry(MeetingToContract, "Concorrência vencendo", "Perdas para concorrente", "Montar comparativo e cases do mesmo segmento"),
    entry(MeetingToContract, "Ciclo de venda longo", "Oportunidades paradas há mais de 30 dias", "Criar gatilho de urgência com condição por prazo"),
    // Visita → Carrinho
    entry(VisitToCart, "Visitantes não adicionam ao carrinho", "Taxa de adição ao carrinho", "Destacar benefícios e frete na página de produto"),
    entry(VisitToCart, "Fotos e descrição insuficientes", "Tempo na página de produto baixo", "Adicionar fotos em uso, vídeo e tabela de medidas"),
    entry(VisitToCart, "Preço sem ancoragem", "Rejeição alta em produtos de maior valor", "Exibir preço parcelado e comparativo de economia"),
    entry(VisitToCart, "Tráfego desqualificado", "Conversão muito baixa em campanhas de topo", "Separar campanhas de topo e remarketing no relatório"),
    entry(VisitToCart, "Ruptura de estoque", "Produtos mais visitados indisponíveis", "Ocultar ou sinalizar variações sem estoque"),
    // Carrinho → Checkout
    entry(CartToCheckout, "Abandono de carrinho alto", "Carrinhos abandonados", "Ativar recuperação de carrinho por e-mail e WhatsApp"),
    entry(CartToCheckout, "Frete revelado tarde", "Abandono após cálculo de frete", "Mostrar calculadora de frete na página de produto"),
    entry(CartToCheckout, "Cadastro obrigatório", "Saída na etapa de login", "Permitir checkout como visitante"),
    entry(CartToCheckout, "Falta de confiança", "Abandono maior em novos clientes", "Exibir selos de segurança e política de troca"),
    entry(CartToCheckout, "Cupom sem efeito", "Saída após tentativa de cupom", "Revisar regras de cupom e mensagens de erro"),
    // Checkout → Pedido
    entry(CheckoutToOrder, "Pedidos não são finalizados", "Taxa de aprovação do pagamento", "Revisar antifraude e taxa de recusa do gateway"),
    entry(CheckoutToOrder, "Poucas formas de pagamento", "Abandono na etapa de pagamento", "Oferecer Pix com desconto e parcelamento sem juros"),
    entry(CheckoutToOrder, "Checkout longo", "Número de etapas do checkout", "Reduzir o checkout para uma página"),
    entry(CheckoutToOrder, "Erros de formulário", "Campos com erro de validação", "Preencher endereço automaticamente pelo CEP"),
    entry(CheckoutToOrder, "Prazo de entrega desanimador", "Abandono após exibição do prazo", "Oferecer opção de entrega expressa"),
];

/// Catalog entries for a stage, capped by status severity.
pub fn match_stage(stage: StageId, status: Status) -> Vec<&'static DiagnosticEntry> {
    let limit = match status {
        Status::Attention => ATTENTION_LIMIT,
        Status::Critical => CRITICAL_LIMIT,
        Status::Ok | Status::NoData | Status::LowSample => return Vec::new(),
    };
    CATALOG
        .iter()
        .filter(|e| e.stage == stage)
        .take(limit)
        .collect()
}

/// Lookup by raw stage id. Unknown ids yield no entries.
pub fn match_rules(stage_id: &str, status: Status) -> Vec<&'static DiagnosticEntry> {
    match stage_id.parse::<StageId>() {
        Ok(stage) => match_stage(stage, status),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_every_stage_has_enough_entries() {
        for stage in StageId::ALL {
            let count = CATALOG.iter().filter(|e| e.stage == stage).count();
            assert!(count >= CRITICAL_LIMIT, "{stage} has only {count} entries");
        }
    }

    #[test]
    fn test_caps_by_status() {
        assert_eq!(match_rules("lead_to_mql", Status::Attention).len(), 3);
        assert_eq!(match_rules("lead_to_mql", Status::Critical).len(), 5);
    }

    #[test]
    fn test_non_actionable_statuses_return_nothing() {
        for status in [Status::Ok, Status::NoData, Status::LowSample] {
            assert!(match_rules("mql_to_sql", status).is_empty());
        }
    }

    #[test]
    fn test_unknown_stage_returns_empty() {
        assert!(match_rules("nope", Status::Critical).is_empty());
        assert!(match_rules("", Status::Attention).is_empty());
    }

    #[test]
    fn test_catalog_order_is_preserved() {
        let critical = match_stage(StageId::LeadToMql, Status::Critical);
        let attention = match_stage(StageId::LeadToMql, Status::Attention);
        assert_eq!(critical[0].situation, "Muitos leads fora do perfil");
        // Attention is a prefix of critical.
        assert_eq!(&critical[..3], &attention[..]);
    }

    proptest! {
        #[test]
        fn prop_matcher_is_deterministic(idx in 0usize..9, critical in any::<bool>()) {
            let stage = StageId::ALL[idx].as_str();
            let status = if critical { Status::Critical } else { Status::Attention };
            prop_assert_eq!(match_rules(stage, status), match_rules(stage, status));
        }
    }
}
